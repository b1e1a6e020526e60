//! Sample-accurate block rendering.
//!
//! ```text
//!   offsets:   0        12             40          frames
//!              │ range  │    range     │   range     │
//!   events:    ▲ap      ▲apply         ▲apply
//! ```
//!
//! Events at an offset are applied before rendering from that offset. Each
//! range is rendered in chunks of at most `MAX_BLOCK_SIZE` frames, one voice at
//! a time into scratch buffers, then summed into the output.

use crate::{
    io::StereoBuffer,
    synth::{allocator::VoiceAllocator, dispatch::TimedEvent, VoiceDsp},
    MAX_BLOCK_SIZE,
};

pub struct BlockRenderer {
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl BlockRenderer {
    pub fn new() -> Self {
        Self {
            scratch_left: vec![0.0; MAX_BLOCK_SIZE],
            scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Overwrite `out` with the sum of all sounding voices, calling `apply`
    /// for each timeline event at its offset.
    ///
    /// `timeline` must be in non-decreasing offset order. Events past the end
    /// of the block, and every event of a zero-length block, are applied after
    /// the last frame.
    pub fn render<D, F>(
        &mut self,
        out: &mut StereoBuffer<'_>,
        timeline: &[TimedEvent],
        voices: &mut VoiceAllocator<D>,
        mut apply: F,
    ) where
        D: VoiceDsp,
        F: FnMut(&TimedEvent, &mut VoiceAllocator<D>),
    {
        out.clear();
        let frames = out.frames();

        let mut cursor = 0;
        let mut next = 0;
        while cursor < frames {
            while let Some(ev) = timeline.get(next).filter(|ev| ev.offset as usize <= cursor) {
                apply(ev, voices);
                next += 1;
            }

            let end = timeline
                .get(next)
                .map_or(frames, |ev| (ev.offset as usize).min(frames));
            self.render_range(out, cursor, end, voices);
            cursor = end;
        }

        for ev in &timeline[next..] {
            apply(ev, voices);
        }
    }

    fn render_range<D: VoiceDsp>(
        &mut self,
        out: &mut StereoBuffer<'_>,
        from: usize,
        to: usize,
        voices: &mut VoiceAllocator<D>,
    ) {
        let mut start = from;
        while start < to {
            let len = (to - start).min(MAX_BLOCK_SIZE);
            let scratch_left = &mut self.scratch_left[..len];
            let scratch_right = &mut self.scratch_right[..len];
            let out_left = &mut out.left[start..start + len];
            let out_right = &mut out.right[start..start + len];

            voices.for_each_sounding(|_, voice| {
                scratch_left.fill(0.0);
                scratch_right.fill(0.0);
                let finished = voice.render(scratch_left, scratch_right);

                for (o, s) in out_left.iter_mut().zip(scratch_left.iter()) {
                    *o += s;
                }
                for (o, s) in out_right.iter_mut().zip(scratch_right.iter()) {
                    *o += s;
                }
                finished
            });

            start += len;
        }
    }
}

impl Default for BlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}
