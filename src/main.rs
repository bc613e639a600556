//! Arcade Core entry point
//!
//! Native: a headless demo that plays a session with a simple autopilot and
//! logs its progress.
//!
//! ```text
//! arcade-core [bricks|racer] [frames] [seed] [tuning.json]
//! ```

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    arcade_core::platform::init_logging();
    log::info!("Arcade core loaded; the host page creates a WebSession per mini-game");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    demo::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::Path;

    use anyhow::bail;
    use arcade_core::audio::NullAudio;
    use arcade_core::consts::*;
    use arcade_core::persistence::{JsonFileStore, SettingsFile};
    use arcade_core::platform::{Key, ManualScheduler, RawInput, init_logging};
    use arcade_core::sim::{GameState, MoverKind, Phase};
    use arcade_core::snapshot::NullRenderer;
    use arcade_core::{GameKind, Host, Session, Tuning, lane_center};

    const DEFAULT_FRAMES: u64 = 60 * 60 * 3;

    pub fn run() -> anyhow::Result<()> {
        init_logging();

        let args: Vec<String> = std::env::args().skip(1).collect();
        let game = match args.first().map(String::as_str) {
            None | Some("bricks") => GameKind::Bricks,
            Some("racer") => GameKind::Racer,
            Some(other) => bail!("unknown game '{}', expected bricks or racer", other),
        };
        let frames: u64 = match args.get(1) {
            Some(n) => n.parse()?,
            None => DEFAULT_FRAMES,
        };
        let seed: u64 = match args.get(2) {
            Some(s) => s.parse()?,
            None => 0x5EED,
        };
        let tuning = args
            .get(3)
            .map(|p| Tuning::load(Path::new(p)))
            .unwrap_or_default();

        let scores = std::env::temp_dir().join("arcade-core-scores.json");
        let settings = std::env::temp_dir().join("arcade-core-settings.json");
        log::info!("Arcade core (native) starting: {} for {} frames", game.id(), frames);
        log::info!("High scores kept in {}", scores.display());

        let scheduler = ManualScheduler::new();
        let host = Host::new(
            JsonFileStore::new(&scores),
            SettingsFile::new(&settings),
            NullAudio,
            scheduler.clone(),
            NullRenderer::default(),
        );
        let mut session = Session::new(game, tuning, host, seed);
        press(&mut session, Key::Enter);

        let mut now = 0.0;
        let mut games = 1;
        for frame in 0..frames {
            let pending = scheduler.take_pending();
            if pending.is_empty() {
                if session.phase() == Phase::GameOver {
                    log::info!(
                        "Game {} over: score {}, level {}",
                        games,
                        session.state().score,
                        session.state().level
                    );
                    games += 1;
                    press(&mut session, Key::Enter);
                    continue;
                }
                break;
            }

            if let Some(x) = autopilot(session.state()) {
                session.handle_input(RawInput::PointerMove { x, y: 0.0 });
            }
            // Alternate 16/17 ms like a 60 Hz display
            now += if frame % 3 == 0 { 16.0 } else { 17.0 };
            for handle in pending {
                session.frame(handle, now);
            }

            if frame % 600 == 0 {
                let state = session.state();
                log::info!(
                    "frame {:>6}: {:?} score {} lives {} level {} entities {}",
                    frame,
                    state.phase,
                    state.score,
                    state.lives,
                    state.level,
                    state.store.len()
                );
            }
        }

        let snapshot = session.snapshot();
        log::info!(
            "Finished after {} game(s): score {}, best {}, snapshot {} bytes",
            games,
            snapshot.hud.score,
            snapshot.hud.high_score,
            snapshot.to_json()?.len()
        );
        session.teardown();
        Ok(())
    }

    fn press(session: &mut Session, key: Key) {
        session.handle_input(RawInput::KeyDown(key));
        session.handle_input(RawInput::KeyUp(key));
    }

    /// Where to put the paddle / vehicle this frame
    fn autopilot(state: &GameState) -> Option<f32> {
        match state.game {
            GameKind::Bricks => {
                // Track the lowest ball that is falling, else the lowest ball
                let ball = state
                    .store
                    .movers
                    .iter()
                    .filter(|m| m.kind == MoverKind::Ball)
                    .max_by(|a, b| {
                        let key = |m: &arcade_core::sim::Mover| {
                            (m.body.vel.y > 0.0, m.body.pos.y)
                        };
                        key(a)
                            .partial_cmp(&key(b))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })?;
                // Aim slightly off-centre so the ball picks up some spin
                let wobble = (state.frame as f32 * 0.05).sin() * state.paddle.body.size.x * 0.2;
                Some(ball.body.pos.x + wobble)
            }
            GameKind::Racer => {
                // Lane whose nearest car ahead is furthest away
                let player = state.paddle.body;
                let clearance = |lane: usize| {
                    let x = lane_center(lane);
                    state
                        .store
                        .obstacles
                        .iter()
                        .filter(|o| (o.body.pos.x - x).abs() < VEHICLE_WIDTH)
                        .filter(|o| o.body.pos.y < player.pos.y)
                        .map(|o| player.top() - o.body.bottom())
                        .fold(f32::INFINITY, f32::min)
                };
                let lane = (0..LANES).max_by(|a, b| {
                    clearance(*a)
                        .partial_cmp(&clearance(*b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })?;
                Some(lane_center(lane))
            }
        }
    }
}
