//! Loop driver and frame scheduling
//!
//! The driver never calls the simulation itself. The host asks a
//! [`FrameScheduler`] for a frame, and when that frame fires it hands the
//! handle back to [`LoopDriver::begin_frame`]. A handle that is not the one
//! the driver is currently waiting for (cancelled, stale, or delivered after
//! teardown) yields `None`, so a dangling callback can never advance the game.

use std::cell::RefCell;
use std::rc::Rc;

use crate::consts::{FRAME_MS, MAX_DELTA_MS};

/// Opaque identifier of one requested frame
pub type FrameHandle = u64;

/// Host primitive that calls back once on the next display refresh
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Timing of one driven frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Wall-clock delta after clamping
    pub delta_ms: f32,
    /// `delta_ms` in units of nominal 60 Hz frames
    pub time_scale: f32,
}

impl FrameTime {
    pub fn from_delta(delta_ms: f64) -> Self {
        let delta_ms = if delta_ms.is_finite() {
            (delta_ms as f32).clamp(0.0, MAX_DELTA_MS)
        } else {
            0.0
        };
        Self {
            delta_ms,
            time_scale: delta_ms / FRAME_MS,
        }
    }
}

/// Owns frame scheduling for one session
pub struct LoopDriver {
    scheduler: Box<dyn FrameScheduler>,
    running: bool,
    pending: Option<FrameHandle>,
    last_time: Option<f64>,
}

impl LoopDriver {
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            running: false,
            pending: None,
            last_time: None,
        }
    }

    /// Begin requesting frames; returns false if already running
    ///
    /// The first frame after a start has a zero delta, so time spent stopped
    /// is never simulated.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_time = None;
        self.pending = Some(self.scheduler.request_frame());
        log::debug!("Loop driver started");
        true
    }

    /// Cancel any pending frame. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.running {
            log::debug!("Loop driver stopped");
        }
        self.running = false;
        self.last_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle of the frame the driver is waiting for
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Accept a fired frame
    ///
    /// Returns `None` when `handle` is not the live pending frame; the caller
    /// must then do nothing at all.
    pub fn begin_frame(&mut self, handle: FrameHandle, now_ms: f64) -> Option<FrameTime> {
        if !self.running || self.pending != Some(handle) {
            return None;
        }
        self.pending = None;
        let delta = self.last_time.map_or(0.0, |last| now_ms - last);
        self.last_time = Some(now_ms);
        Some(FrameTime::from_delta(delta))
    }

    /// Request the next frame after a processed one
    pub fn reschedule(&mut self) {
        if self.running && self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame());
        }
    }
}

impl Drop for LoopDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
struct ManualFrames {
    next: FrameHandle,
    pending: Vec<FrameHandle>,
}

/// Scheduler driven by hand, for headless runs and tests
///
/// Clones share the same queue, so the host keeps one clone to fire frames
/// while the driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    frames: Rc<RefCell<ManualFrames>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the requested frames, oldest first
    pub fn take_pending(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.frames.borrow_mut().pending)
    }

    pub fn pending_count(&self) -> usize {
        self.frames.borrow().pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut frames = self.frames.borrow_mut();
        frames.next += 1;
        let handle = frames.next;
        frames.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.borrow_mut().pending.retain(|h| *h != handle);
    }
}

/// `requestAnimationFrame` scheduler
///
/// The callback is owned by the host; `latest` is shared with it so the
/// callback can pass the matching handle back to the session.
#[cfg(target_arch = "wasm32")]
pub struct AnimationFrameScheduler {
    callback: Rc<wasm_bindgen::closure::Closure<dyn FnMut(f64)>>,
    latest: Rc<std::cell::Cell<FrameHandle>>,
}

#[cfg(target_arch = "wasm32")]
impl AnimationFrameScheduler {
    pub fn new(
        callback: Rc<wasm_bindgen::closure::Closure<dyn FnMut(f64)>>,
        latest: Rc<std::cell::Cell<FrameHandle>>,
    ) -> Self {
        Self { callback, latest }
    }
}

#[cfg(target_arch = "wasm32")]
impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        use wasm_bindgen::JsCast;

        let Some(window) = web_sys::window() else {
            log::warn!("No window; frame not scheduled");
            return 0;
        };
        match window.request_animation_frame((*self.callback).as_ref().unchecked_ref()) {
            Ok(id) => {
                let handle = id as FrameHandle;
                self.latest.set(handle);
                handle
            }
            Err(e) => {
                log::warn!("requestAnimationFrame failed: {:?}", e);
                0
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.cancel_animation_frame(handle as i32) {
                log::warn!("cancelAnimationFrame failed: {:?}", e);
            }
        }
    }
}
