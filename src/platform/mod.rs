//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Frame scheduling and wall-clock deltas
//! - Input events
//! - Logger installation

pub mod clock;
pub mod input;

pub use clock::{FrameHandle, FrameScheduler, FrameTime, LoopDriver, ManualScheduler};
pub use input::{Commands, InputState, Key, RawInput};

#[cfg(target_arch = "wasm32")]
pub use clock::AnimationFrameScheduler;

/// Install the logger for the current target
///
/// Safe to call more than once; later calls are ignored.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already installed");
    }
}

/// Install the logger for the current target
///
/// Safe to call more than once; later calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .is_err()
    {
        log::debug!("Logger already installed");
    }
}
