//! Fixed-size voice pool.
//!
//! The pool is filled once at construction and never resized. When every
//! slot is sounding, a new note steals one according to [`StealPolicy`] and the
//! evicted note is recorded so the host and UI can be told it ended.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    io::NoteKey,
    param::{ParamId, ParamValues},
    synth::{
        voice::{Voice, VoiceState},
        VoiceDsp, VoiceFactory,
    },
};

/// Pool index of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(usize);

impl VoiceHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of [`VoiceAllocator::activate`]. Never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// An idle slot was used.
    Assigned(VoiceHandle),
    /// The pool was full; `evicted` was cut off to make room. `was_held` is
    /// false when the victim had already been released.
    Stolen {
        handle: VoiceHandle,
        evicted: NoteKey,
        was_held: bool,
    },
    /// Overlapping notes are disabled and the same key was already held;
    /// its voice was restarted in place.
    Retriggered { handle: VoiceHandle, previous: NoteKey },
}

impl Allocation {
    pub fn handle(&self) -> VoiceHandle {
        match *self {
            Allocation::Assigned(handle)
            | Allocation::Stolen { handle, .. }
            | Allocation::Retriggered { handle, .. } => handle,
        }
    }
}

/// Which sounding voice to sacrifice when the pool is full.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Lowest pool index. No attempt at musical judgement.
    #[default]
    FirstFound,
    /// The voice started longest ago.
    Oldest,
    /// The oldest releasing voice, else the oldest voice.
    ReleasingFirst,
}

/// What a note-off does to the voice it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Enter the release tail.
    Tail,
    /// Amp envelope bypassed: stop now.
    Gated,
}

pub struct VoiceAllocator<D: VoiceDsp> {
    voices: Vec<Voice<D>>,
    policy: StealPolicy,
    overlapping_notes: bool,
    next_age: u64,

    /// Notes cut off by stealing or retriggering, not yet reported.
    terminated: Vec<NoteKey>,
    /// Notes that ended on their own (tail finished, gated off).
    ended: Vec<NoteKey>,
    report_overflow: u64,
    stolen: u64,
}

/// Push into a report list without growing it.
#[inline]
fn record(list: &mut Vec<NoteKey>, overflow: &mut u64, note: NoteKey) {
    if list.len() < list.capacity() {
        list.push(note);
    } else {
        *overflow += 1;
    }
}

impl<D: VoiceDsp> VoiceAllocator<D> {
    /// Fill a pool of `count` voices from `factory`.
    ///
    /// `report_capacity` bounds how many terminated/ended notes one block
    /// can report.
    pub fn new<F>(
        count: usize,
        factory: &F,
        sample_rate: f32,
        policy: StealPolicy,
        overlapping_notes: bool,
        report_capacity: usize,
    ) -> Self
    where
        F: VoiceFactory<Voice = D>,
    {
        let voices = (0..count)
            .map(|_| Voice::new(factory.create_voice(), sample_rate))
            .collect();

        Self {
            voices,
            policy,
            overlapping_notes,
            next_age: 0,
            terminated: Vec::with_capacity(report_capacity),
            ended: Vec::with_capacity(report_capacity + count),
            report_overflow: 0,
            stolen: 0,
        }
    }

    /// Start a note on a free slot, stealing one if there is none.
    pub fn activate(&mut self, note: NoteKey, velocity: f32, params: &ParamValues) -> Allocation {
        debug_assert!(!self.voices.is_empty());

        let age = self.next_age;
        self.next_age += 1;

        if !self.overlapping_notes {
            if let Some(idx) = self
                .voices
                .iter()
                .position(|v| v.state() == VoiceState::Active && v.note().same_key(&note))
            {
                let previous = self.restart(idx, note, velocity, params, age);
                return Allocation::Retriggered {
                    handle: VoiceHandle(idx),
                    previous,
                };
            }
        }

        if let Some(idx) = self.voices.iter().position(|v| v.is_idle()) {
            self.voices[idx].start(note, velocity, params, age);
            return Allocation::Assigned(VoiceHandle(idx));
        }

        let idx = self.choose_victim();
        let was_held = self.voices[idx].state() == VoiceState::Active;
        let evicted = self.restart(idx, note, velocity, params, age);
        self.stolen += 1;
        Allocation::Stolen {
            handle: VoiceHandle(idx),
            evicted,
            was_held,
        }
    }

    fn restart(
        &mut self,
        idx: usize,
        note: NoteKey,
        velocity: f32,
        params: &ParamValues,
        age: u64,
    ) -> NoteKey {
        let voice = &mut self.voices[idx];
        let previous = voice.note();
        voice.free();
        voice.start(note, velocity, params, age);
        record(&mut self.terminated, &mut self.report_overflow, previous);
        previous
    }

    fn choose_victim(&self) -> usize {
        let oldest = || {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_sounding())
                .min_by_key(|(_, v)| v.age())
                .map(|(idx, _)| idx)
        };

        let choice = match self.policy {
            StealPolicy::FirstFound => self.voices.iter().position(|v| v.is_sounding()),
            StealPolicy::Oldest => oldest(),
            StealPolicy::ReleasingFirst => self
                .voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.state() == VoiceState::Releasing)
                .min_by_key(|(_, v)| v.age())
                .map(|(idx, _)| idx)
                .or_else(oldest),
        };
        choice.unwrap_or(0)
    }

    /// Release the first Active voice playing `target`.
    ///
    /// Port, channel and key must match exactly; the note id is compared
    /// unless the target's is -1. No match is a no-op.
    pub fn release(&mut self, target: NoteKey, mode: ReleaseMode) -> Option<VoiceHandle> {
        let idx = self.voices.iter().position(|v| {
            v.state() == VoiceState::Active
                && v.note().same_key(&target)
                && (target.note_id == -1 || v.note().note_id == target.note_id)
        })?;

        let voice = &mut self.voices[idx];
        match mode {
            ReleaseMode::Tail => voice.release(),
            ReleaseMode::Gated => {
                voice.free();
                record(&mut self.ended, &mut self.report_overflow, voice.note());
            }
        }
        Some(VoiceHandle(idx))
    }

    /// Sounding voices in pool order. Cheap to call again for a fresh pass.
    pub fn active(&self) -> impl Iterator<Item = VoiceHandle> + '_ {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_sounding())
            .map(|(idx, _)| VoiceHandle(idx))
    }

    /// Visit every sounding voice. When `f` returns true the voice has
    /// finished: it goes back to Idle right away and its note is reported
    /// as ended.
    pub fn for_each_sounding<F>(&mut self, mut f: F)
    where
        F: FnMut(VoiceHandle, &mut Voice<D>) -> bool,
    {
        for (idx, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_idle() {
                continue;
            }
            if f(VoiceHandle(idx), voice) {
                voice.free();
                record(&mut self.ended, &mut self.report_overflow, voice.note());
            }
        }
    }

    /// Push new base parameter values to every sounding voice.
    pub fn apply_params(&mut self, params: &ParamValues) {
        for voice in self.voices.iter_mut().filter(|v| v.is_sounding()) {
            voice.set_params(params);
        }
    }

    /// Set a modulation offset on every sounding voice `target` addresses.
    /// Returns how many voices matched.
    pub fn apply_modulation(&mut self, id: ParamId, target: &NoteKey, amount: f64) -> usize {
        let mut matched = 0;
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.is_sounding() && target.matches(&v.note()))
        {
            voice.set_modulation(id, amount);
            matched += 1;
        }
        matched
    }

    pub fn drain_terminated(&mut self) -> std::vec::Drain<'_, NoteKey> {
        self.terminated.drain(..)
    }

    pub fn drain_ended(&mut self) -> std::vec::Drain<'_, NoteKey> {
        self.ended.drain(..)
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice<D>> {
        self.voices.get(handle.0)
    }

    pub fn voices(&self) -> &[Voice<D>] {
        &self.voices
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn sounding_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }

    pub fn overlapping_notes(&self) -> bool {
        self.overlapping_notes
    }

    /// Notes that could not be reported because a report list was full.
    pub fn report_overflow(&self) -> u64 {
        self.report_overflow
    }

    /// Total voices stolen since construction.
    pub fn stolen(&self) -> u64 {
        self.stolen
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Silence everything and forget pending reports.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
        self.terminated.clear();
        self.ended.clear();
    }
}
