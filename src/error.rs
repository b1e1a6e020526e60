use thiserror::Error;

/// Rejected [`crate::EngineConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("voice count must be between 1 and {max}, got {got}")]
    VoiceCount { got: usize, max: usize },

    #[error("queue capacity must be at least {min}, got {got}")]
    QueueCapacity { got: usize, min: usize },

    #[error("timeline capacity must be at least 1")]
    TimelineCapacity,

    #[error("sample rate must be positive and finite, got {0}")]
    SampleRate(f32),
}

/// Failure to restore a [`crate::param::PatchState`].
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("unsupported patch version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("parameter {id} has non-finite value")]
    NonFinite { id: u32 },
}
