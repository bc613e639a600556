//! Browser bindings
//!
//! [`WebSession`] is the handle a host page keeps for one mounted mini-game.
//! It wires the session to `requestAnimationFrame`, Web Audio and
//! LocalStorage. The page forwards keyboard and pointer events, reads
//! [`WebSession::snapshot_json`] when it paints, and calls `free()` on
//! unmount, which stops the loop.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use crate::audio::{AudioSink, NullAudio, WebAudio};
use crate::persistence::LocalStorageStore;
use crate::platform::{AnimationFrameScheduler, FrameHandle, Key, RawInput, init_logging};
use crate::snapshot::NullRenderer;
use crate::{GameKind, Host, Session, Tuning};

fn game_kind(id: &str) -> Result<GameKind, JsValue> {
    match id {
        "bricks" => Ok(GameKind::Bricks),
        "racer" => Ok(GameKind::Racer),
        other => Err(JsValue::from_str(&format!("unknown game '{}'", other))),
    }
}

fn web_audio() -> Box<dyn AudioSink> {
    match WebAudio::new() {
        Ok(audio) => Box::new(audio),
        Err(e) => {
            log::warn!("Audio unavailable, playing silently: {:#}", e);
            Box::new(NullAudio)
        }
    }
}

/// One mounted mini-game
#[wasm_bindgen]
pub struct WebSession {
    session: Rc<RefCell<Session>>,
}

impl WebSession {
    fn key(&self, code: &str, event: fn(Key) -> RawInput) -> bool {
        match Key::from_code(code) {
            Some(key) => {
                self.session.borrow_mut().handle_input(event(key));
                true
            }
            None => false,
        }
    }
}

#[wasm_bindgen]
impl WebSession {
    /// Mount `game` ("bricks" or "racer") in its menu
    ///
    /// `tuning_json` overrides the balance table; JSON that does not parse
    /// is logged and the defaults are used.
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, seed: f64, tuning_json: Option<String>) -> Result<WebSession, JsValue> {
        init_logging();
        let game = game_kind(game)?;
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning override: {:#}", e);
                Tuning::default()
            }),
            None => Tuning::default(),
        };
        let audio = web_audio();
        let latest: Rc<Cell<FrameHandle>> = Rc::new(Cell::new(0));

        // The rAF callback holds the session weakly; the session owns the
        // callback through its scheduler.
        let session = Rc::new_cyclic(|weak: &Weak<RefCell<Session>>| {
            let weak = weak.clone();
            let fired = latest.clone();
            let callback = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
                let Some(session) = weak.upgrade() else {
                    return;
                };
                match session.try_borrow_mut() {
                    Ok(mut session) => {
                        session.frame(fired.get(), now);
                    }
                    Err(_) => log::warn!("Frame fired while the session was busy; dropped"),
                }
            });
            let host = Host {
                storage: Box::new(LocalStorageStore::new()),
                settings: Box::new(LocalStorageStore::new()),
                audio,
                frames: Box::new(AnimationFrameScheduler::new(Rc::new(callback), latest)),
                renderer: Box::new(NullRenderer::default()),
            };
            RefCell::new(Session::new(game, tuning, host, seed as u64))
        });

        Ok(Self { session })
    }

    /// Forward a `keydown`; returns true when the key is one the game uses
    /// so the page can call `preventDefault`
    pub fn key_down(&self, code: &str) -> bool {
        self.key(code, RawInput::KeyDown)
    }

    pub fn key_up(&self, code: &str) -> bool {
        self.key(code, RawInput::KeyUp)
    }

    /// Pointer events take play-area coordinates (480 x 640)
    pub fn pointer_down(&self, x: f32, y: f32, time_ms: f64) {
        self.session
            .borrow_mut()
            .handle_input(RawInput::PointerDown { x, y, time_ms });
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.session
            .borrow_mut()
            .handle_input(RawInput::PointerMove { x, y });
    }

    pub fn pointer_up(&self, x: f32, y: f32, time_ms: f64) {
        self.session
            .borrow_mut()
            .handle_input(RawInput::PointerUp { x, y, time_ms });
    }

    pub fn start(&self) -> bool {
        self.session.borrow_mut().start()
    }

    pub fn pause(&self) -> bool {
        self.session.borrow_mut().pause()
    }

    pub fn resume(&self) -> bool {
        self.session.borrow_mut().resume()
    }

    pub fn play_again(&self) -> bool {
        self.session.borrow_mut().play_again()
    }

    pub fn main_menu(&self) -> bool {
        self.session.borrow_mut().main_menu()
    }

    /// Call on `blur` / `visibilitychange` to hidden
    pub fn suspend(&self) -> bool {
        self.session.borrow_mut().suspend()
    }

    /// Latest frame snapshot as JSON
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.session
            .borrow()
            .snapshot()
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
    }

    pub fn teardown(&self) {
        self.session.borrow_mut().teardown();
    }
}
