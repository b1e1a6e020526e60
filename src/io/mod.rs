// Purpose - host-facing interfaces: inbound events, outbound events, audio buffers

pub mod converter;
pub mod events;
pub mod midi;

pub use events::{
    EventSink, HostEvent, HostEventKind, NoteKey, OutputEvent, OutputEventKind, OutputEventList,
};

/// Non-interleaved stereo output for one block.
#[derive(Debug)]
pub struct StereoBuffer<'a> {
    pub left: &'a mut [f32],
    pub right: &'a mut [f32],
}

impl<'a> StereoBuffer<'a> {
    /// Wrap two channel slices. The block length is the shorter of the two.
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }
}

/// Owned stereo buffers, for offline rendering and tests.
#[derive(Debug, Default, Clone)]
pub struct AudioOutput {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl AudioOutput {
    pub fn with_frames(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    pub fn as_stereo(&mut self) -> StereoBuffer<'_> {
        StereoBuffer::new(&mut self.left, &mut self.right)
    }

    /// True when every sample in both channels is exactly zero.
    pub fn is_silent(&self) -> bool {
        self.left.iter().chain(self.right.iter()).all(|s| *s == 0.0)
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }
}
