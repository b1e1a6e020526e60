// Purpose: voice pool, per-block event timeline and the host-facing engine.
// This layer sits above the voice DSP and drives it from host and UI events.

pub mod allocator;
pub mod dispatch;
pub mod factory;
pub mod poly;
pub mod render;
pub mod voice;

#[cfg(test)]
pub(crate) mod test_voice;

pub use allocator::{Allocation, ReleaseMode, StealPolicy, VoiceAllocator, VoiceHandle};
pub use dispatch::{
    DispatchStats, EventDispatcher, EventSource, TimedEvent, Timeline, TimelineEvent,
};
pub use factory::{VoiceDsp, VoiceFactory};
pub use poly::{PolySynth, ProcessStatus, SynthStats, VoiceInfo};
pub use render::BlockRenderer;
pub use voice::{Voice, VoiceState};
