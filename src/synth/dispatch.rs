//! Per-block event timeline.
//!
//! ```text
//!   FromUi queue ──┐  offset 0, enqueue order
//!                  ├──► Timeline (non-decreasing offsets) ──► apply() per event
//!   host events ───┘  host order, offsets clamped
//! ```
//!
//! Nothing here allocates once the timeline has been built.

use std::sync::Arc;

use crate::{
    comms::{FromUi, Receiver, SynthComms, ToUi},
    io::{
        converter::midi_to_host, EventSink, HostEvent, HostEventKind, NoteKey, OutputEvent,
        OutputEventKind,
    },
    param::{ParamId, ParamTable, ParamValues},
    synth::{
        allocator::{Allocation, ReleaseMode, VoiceAllocator},
        VoiceDsp,
    },
};

/// Who asked for a parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Host,
    Ui,
}

/// An event after validation, ready to act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent {
    NoteOn { note: NoteKey, velocity: f32 },
    NoteOff { note: NoteKey },
    ParamValue { id: ParamId, value: f64, source: EventSource },
    ParamMod { id: ParamId, target: NoteKey, amount: f64 },
    BeginEdit { id: ParamId },
    EndEdit { id: ParamId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub offset: u32,
    pub event: TimelineEvent,
}

/// Fixed-capacity list of one block's events.
#[derive(Debug)]
pub struct Timeline {
    events: Vec<TimedEvent>,
    limit: usize,
}

impl Timeline {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            limit: capacity,
        }
    }

    /// False when the timeline is full.
    pub fn push(&mut self, event: TimedEvent) -> bool {
        if self.is_full() {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn is_full(&self) -> bool {
        self.events.len() >= self.limit
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Things the dispatcher dropped instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events naming a parameter id the table does not know.
    pub unknown_params: u64,
    /// Non-finite values, and modulation of parameters that do not accept it.
    pub rejected_values: u64,
    /// Events that did not fit in the timeline.
    pub timeline_overflow: u64,
    /// Output events the host sink refused.
    pub output_overflow: u64,
    /// Raw MIDI other than note on/off.
    pub ignored_midi: u64,
}

pub struct EventDispatcher {
    params: Arc<ParamTable>,
    stats: DispatchStats,
}

impl EventDispatcher {
    pub fn new(params: Arc<ParamTable>) -> Self {
        Self {
            params,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Build the timeline for a block of `frames` samples.
    ///
    /// Pending UI messages come first at offset 0, then host events in host
    /// order. A host offset past the block lands on the last frame; one that
    /// goes backwards is raised to the previous offset.
    ///
    /// Host events are never crowded out by UI traffic: room for them is
    /// set aside before the UI queue is drained. UI messages that do not fit
    /// in the rest stay queued for the next block.
    pub fn collect(
        &mut self,
        host_events: &[HostEvent],
        ui: &mut Receiver<FromUi>,
        timeline: &mut Timeline,
        frames: usize,
    ) {
        timeline.clear();

        let ui_room = timeline.capacity() - host_events.len().min(timeline.capacity());
        let mut drained = 0;
        while drained < ui_room {
            let Some(msg) = ui.try_dequeue() else { break };
            drained += 1;
            if let Some(event) = self.ui_event(msg) {
                timeline.push(TimedEvent { offset: 0, event });
            }
        }

        let last_frame = frames.saturating_sub(1) as u32;
        let mut previous = 0;
        for host in host_events {
            let offset = host.offset.min(last_frame).max(previous);
            previous = offset;

            let Some(event) = self.host_event(host.kind) else {
                continue;
            };
            if !timeline.push(TimedEvent { offset, event }) {
                self.stats.timeline_overflow += 1;
            }
        }
    }

    fn param(&mut self, raw: u32) -> Option<ParamId> {
        let id = self.params.lookup(raw).map(|info| info.id);
        if id.is_none() {
            self.stats.unknown_params += 1;
        }
        id
    }

    fn ui_event(&mut self, msg: FromUi) -> Option<TimelineEvent> {
        Some(match msg {
            FromUi::BeginEdit { id } => TimelineEvent::BeginEdit { id: self.param(id)? },
            FromUi::EndEdit { id } => TimelineEvent::EndEdit { id: self.param(id)? },
            FromUi::AdjustValue { id, value } => TimelineEvent::ParamValue {
                id: self.param(id)?,
                value,
                source: EventSource::Ui,
            },
        })
    }

    fn host_event(&mut self, kind: HostEventKind) -> Option<TimelineEvent> {
        Some(match kind {
            HostEventKind::NoteOn { note, velocity } => TimelineEvent::NoteOn {
                note,
                velocity: velocity.clamp(0.0, 1.0) as f32,
            },
            HostEventKind::NoteOff { note, .. } => TimelineEvent::NoteOff { note },
            HostEventKind::ParamValue { id, value } => TimelineEvent::ParamValue {
                id: self.param(id)?,
                value,
                source: EventSource::Host,
            },
            HostEventKind::ParamMod { id, target, amount } => TimelineEvent::ParamMod {
                id: self.param(id)?,
                target,
                amount,
            },
            HostEventKind::Midi { port, data } => match midi_to_host(port, data) {
                Some(converted) => return self.host_event(converted),
                None => {
                    self.stats.ignored_midi += 1;
                    return None;
                }
            },
        })
    }

    /// Act on one timeline event.
    pub fn apply<D, S>(
        &mut self,
        ev: &TimedEvent,
        values: &mut ParamValues,
        voices: &mut VoiceAllocator<D>,
        comms: &mut SynthComms,
        sink: &mut S,
    ) where
        D: VoiceDsp,
        S: EventSink + ?Sized,
    {
        match ev.event {
            TimelineEvent::NoteOn { note, velocity } => {
                // A stolen held key goes up on the display; a retrigger keeps it held.
                let allocation = voices.activate(note, velocity, values);
                if let Allocation::Stolen {
                    evicted,
                    was_held: true,
                    ..
                } = allocation
                {
                    comms.send(ToUi::NoteOff { key: evicted.key });
                }
                comms.send(ToUi::NoteOn { key: note.key });
            }
            TimelineEvent::NoteOff { note } => {
                let mode = if values.is_on(ParamId::AmpIsGate) {
                    ReleaseMode::Gated
                } else {
                    ReleaseMode::Tail
                };
                if voices.release(note, mode).is_some() {
                    comms.send(ToUi::NoteOff { key: note.key });
                }
            }
            TimelineEvent::ParamValue { id, value, source } => {
                let Some(value) = self.params.info(id).sanitize(value) else {
                    self.stats.rejected_values += 1;
                    return;
                };
                values.set(id, value);
                voices.apply_params(values);
                comms.send(ToUi::ParamValue { id: id.raw(), value });

                // The host did not see this change; tell it so it can record it.
                if source == EventSource::Ui {
                    self.emit(
                        sink,
                        ev.offset,
                        OutputEventKind::ParamValue { id: id.raw(), value },
                    );
                }
            }
            TimelineEvent::ParamMod { id, target, amount } => {
                if !amount.is_finite() || !self.params.info(id).modulatable {
                    self.stats.rejected_values += 1;
                    return;
                }
                voices.apply_modulation(id, &target, amount);
            }
            TimelineEvent::BeginEdit { id } => {
                self.emit(sink, ev.offset, OutputEventKind::GestureBegin { id: id.raw() });
            }
            TimelineEvent::EndEdit { id } => {
                self.emit(sink, ev.offset, OutputEventKind::GestureEnd { id: id.raw() });
            }
        }
    }

    pub(crate) fn emit<S: EventSink + ?Sized>(
        &mut self,
        sink: &mut S,
        offset: u32,
        kind: OutputEventKind,
    ) {
        if !sink.try_push(OutputEvent { offset, kind }) {
            self.stats.output_overflow += 1;
        }
    }

    /// Queue a `ToUi::ParamValue` for every parameter. Returns how many fit.
    pub fn send_all_values(&self, values: &ParamValues, comms: &mut SynthComms) -> usize {
        self.params
            .iter()
            .filter(|info| {
                comms.send(ToUi::ParamValue {
                    id: info.id.raw(),
                    value: values.get(info.id),
                })
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comms::{channel, UiHandle},
        synth::{test_voice::TestVoice, StealPolicy, VoiceState},
    };

    struct Fixture {
        dispatcher: EventDispatcher,
        timeline: Timeline,
        values: ParamValues,
        voices: VoiceAllocator<TestVoice>,
        comms: SynthComms,
        ui: UiHandle,
        out: Vec<OutputEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let table = Arc::new(ParamTable::new());
            let (comms, ui) = channel(64, Arc::clone(&table));
            Self {
                values: table.defaults(),
                dispatcher: EventDispatcher::new(table),
                timeline: Timeline::with_capacity(32),
                voices: VoiceAllocator::new(
                    4,
                    &|| TestVoice::with_tail(0),
                    48_000.0,
                    StealPolicy::FirstFound,
                    true,
                    8,
                ),
                comms,
                ui,
                out: Vec::new(),
            }
        }

        fn run(&mut self, host: &[HostEvent], frames: usize) {
            let Fixture {
                dispatcher,
                timeline,
                values,
                voices,
                comms,
                out,
                ..
            } = &mut *self;
            dispatcher.collect(host, &mut comms.from_ui, timeline, frames);
            for ev in timeline.events() {
                dispatcher.apply(ev, values, voices, comms, out);
            }
        }

        fn acks(&mut self) -> Vec<ToUi> {
            std::iter::from_fn(|| self.ui.try_recv()).collect()
        }
    }

    fn offsets(timeline: &Timeline) -> Vec<u32> {
        timeline.events().iter().map(|e| e.offset).collect()
    }

    #[test]
    fn ui_messages_come_first_at_offset_zero() {
        let mut fx = Fixture::new();
        fx.ui.adjust(ParamId::Cutoff, 40.0);
        let host = [HostEvent::param_value(0, ParamId::Cutoff.raw(), 90.0)];

        fx.run(&host, 64);

        assert_eq!(offsets(&fx.timeline), vec![0, 0]);
        assert!(matches!(
            fx.timeline.events()[0].event,
            TimelineEvent::ParamValue { source: EventSource::Ui, .. }
        ));
        // Host event at the same offset wins because it is applied last.
        assert_eq!(fx.values.get(ParamId::Cutoff), 90.0);
    }

    #[test]
    fn host_offsets_are_clamped_and_kept_in_order() {
        let mut fx = Fixture::new();
        let note = NoteKey::untagged(0, 0, 60);
        let host = [
            HostEvent::note_on(10, note, 1.0),
            HostEvent::note_off(4, note),
            HostEvent::param_value(500, ParamId::Resonance.raw(), 0.1),
        ];
        fx.dispatcher
            .collect(&host, &mut fx.comms.from_ui, &mut fx.timeline, 64);
        assert_eq!(offsets(&fx.timeline), vec![10, 10, 63]);
    }

    #[test]
    fn each_param_write_is_acknowledged() {
        let mut fx = Fixture::new();
        let id = ParamId::AmpRelease.raw();
        let host = [
            HostEvent::param_value(0, id, 0.1),
            HostEvent::param_value(8, id, 0.3),
            HostEvent::param_value(16, id, 0.5),
        ];
        fx.run(&host, 32);

        assert_eq!(fx.values.get(ParamId::AmpRelease), 0.5);
        let acks = fx.acks();
        assert_eq!(
            acks,
            vec![
                ToUi::ParamValue { id, value: 0.1 },
                ToUi::ParamValue { id, value: 0.3 },
                ToUi::ParamValue { id, value: 0.5 },
            ]
        );
        // Host-originated writes are not echoed back to the host.
        assert!(fx.out.is_empty());
    }

    #[test]
    fn unknown_ids_are_dropped_and_counted() {
        let mut fx = Fixture::new();
        fx.ui.try_send(FromUi::AdjustValue { id: 12345, value: 1.0 });
        let before = fx.values;
        fx.run(&[HostEvent::param_value(0, 999, 1.0)], 16);

        assert!(fx.timeline.is_empty());
        assert_eq!(fx.dispatcher.stats().unknown_params, 2);
        assert_eq!(fx.values, before);
    }

    #[test]
    fn out_of_range_values_are_clamped_and_nan_rejected() {
        let mut fx = Fixture::new();
        let host = [
            HostEvent::param_value(0, ParamId::Cutoff.raw(), 1000.0),
            HostEvent::param_value(1, ParamId::Resonance.raw(), f64::NAN),
        ];
        fx.run(&host, 16);

        assert_eq!(fx.values.get(ParamId::Cutoff), 127.0);
        assert_eq!(fx.values.get(ParamId::Resonance), 0.7);
        assert_eq!(fx.dispatcher.stats().rejected_values, 1);
    }

    #[test]
    fn gestures_and_ui_edits_reach_the_host() {
        let mut fx = Fixture::new();
        fx.ui.begin_edit(ParamId::Cutoff);
        fx.ui.adjust(ParamId::Cutoff, 50.0);
        fx.ui.end_edit(ParamId::Cutoff);
        fx.run(&[], 16);

        let kinds: Vec<_> = fx.out.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OutputEventKind::GestureBegin { id: 17 },
                OutputEventKind::ParamValue { id: 17, value: 50.0 },
                OutputEventKind::GestureEnd { id: 17 },
            ]
        );
        assert_eq!(fx.values.get(ParamId::Cutoff), 50.0);
    }

    #[test]
    fn notes_drive_the_allocator() {
        let mut fx = Fixture::new();
        let note = NoteKey::untagged(0, 0, 64);
        fx.run(&[HostEvent::note_on(0, note, 0.5)], 16);
        assert_eq!(fx.voices.sounding_count(), 1);

        fx.run(&[HostEvent::note_off(0, note)], 16);
        assert_eq!(
            fx.acks(),
            vec![ToUi::NoteOn { key: 64 }, ToUi::NoteOff { key: 64 }]
        );
    }

    #[test]
    fn gate_mode_frees_on_note_off() {
        let mut fx = Fixture::new();
        let note = NoteKey::untagged(0, 0, 64);
        let host = [
            HostEvent::param_value(0, ParamId::AmpIsGate.raw(), 1.0),
            HostEvent::note_on(0, note, 1.0),
            HostEvent::note_off(4, note),
        ];
        fx.run(&host, 16);
        assert_eq!(fx.voices.sounding_count(), 0);
        assert_eq!(fx.voices.drain_ended().collect::<Vec<_>>(), vec![note]);
    }

    #[test]
    fn midi_notes_are_converted() {
        let mut fx = Fixture::new();
        let host = [
            HostEvent::midi(0, 0, [0x90, 60, 127]),
            HostEvent::midi(2, 0, [0xB0, 1, 64]),
        ];
        fx.run(&host, 16);
        assert_eq!(fx.voices.sounding_count(), 1);
        assert_eq!(fx.dispatcher.stats().ignored_midi, 1);
    }

    #[test]
    fn full_timeline_leaves_ui_messages_queued() {
        let mut fx = Fixture::new();
        fx.timeline = Timeline::with_capacity(2);
        for value in [10.0, 20.0, 30.0] {
            fx.ui.adjust(ParamId::Cutoff, value);
        }
        fx.run(&[HostEvent::param_value(0, ParamId::Resonance.raw(), 0.5)], 16);

        // The host event keeps its slot; one UI message fits beside it.
        assert_eq!(fx.values.get(ParamId::Cutoff), 10.0);
        assert_eq!(fx.values.get(ParamId::Resonance), 0.5);
        assert_eq!(fx.dispatcher.stats().timeline_overflow, 0);

        fx.run(&[], 16);
        assert_eq!(fx.values.get(ParamId::Cutoff), 30.0);
    }

    #[test]
    fn ui_flood_cannot_swallow_a_note_off() {
        let mut fx = Fixture::new();
        fx.timeline = Timeline::with_capacity(8);
        let note = NoteKey::untagged(0, 0, 60);
        fx.run(&[HostEvent::note_on(0, note, 1.0)], 16);

        for i in 0..32 {
            fx.ui.adjust(ParamId::Cutoff, f64::from(i));
        }
        fx.run(&[HostEvent::note_off(0, note)], 16);

        assert_eq!(fx.voices.voices()[0].state(), VoiceState::Releasing);
        assert_eq!(fx.dispatcher.stats().timeline_overflow, 0);
    }

    #[test]
    fn stealing_a_released_voice_does_not_release_its_key_twice() {
        let mut fx = Fixture::new();
        let keys = [60, 62, 64, 65];
        let host: Vec<_> = keys
            .iter()
            .map(|&k| HostEvent::note_on(0, NoteKey::untagged(0, 0, k), 1.0))
            .collect();
        fx.run(&host, 16);
        fx.run(&[HostEvent::note_off(0, NoteKey::untagged(0, 0, 60))], 16);
        fx.acks();

        // Slot 0 is releasing key 60; the first-found victim is still slot 0.
        fx.run(&[HostEvent::note_on(0, NoteKey::untagged(0, 0, 67), 1.0)], 16);
        assert_eq!(fx.acks(), vec![ToUi::NoteOn { key: 67 }]);

        // Key 67 is still held in slot 0, so stealing it releases it on the display.
        fx.run(&[HostEvent::note_on(0, NoteKey::untagged(0, 0, 69), 1.0)], 16);
        assert_eq!(
            fx.acks(),
            vec![ToUi::NoteOff { key: 67 }, ToUi::NoteOn { key: 69 }]
        );
    }

    #[test]
    fn refresh_sends_every_value() {
        let mut fx = Fixture::new();
        let sent = fx.dispatcher.send_all_values(&fx.values, &mut fx.comms);
        assert_eq!(sent, crate::param::PARAM_COUNT);
        assert_eq!(fx.acks().len(), crate::param::PARAM_COUNT);
    }

    #[test]
    fn stepped_params_refuse_modulation() {
        let mut fx = Fixture::new();
        let note = NoteKey::untagged(0, 0, 60);
        let everyone = NoteKey::new(-1, -1, -1, -1);
        let host = [
            HostEvent::note_on(0, note, 1.0),
            HostEvent::param_mod(0, ParamId::FilterMode.raw(), everyone, 2.0),
            HostEvent::param_mod(0, ParamId::Cutoff.raw(), everyone, 5.0),
        ];
        fx.run(&host, 16);

        let voice = &fx.voices.voices()[0];
        assert_eq!(voice.modulation(ParamId::FilterMode), 0.0);
        assert_eq!(voice.modulation(ParamId::Cutoff), 5.0);
        assert_eq!(fx.dispatcher.stats().rejected_values, 1);
    }
}
