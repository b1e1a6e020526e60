pub mod comms; // Lock-free link to the control surface
pub mod config;
pub mod dsp;
pub mod error;
pub mod io;
pub mod param; // Parameter metadata, storage cells and patch state
pub mod synth; // Voice management and polyphony

pub use comms::UiHandle;
pub use config::EngineConfig;
pub use error::{ConfigError, StateError};
pub use synth::{PolySynth, ProcessStatus};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
