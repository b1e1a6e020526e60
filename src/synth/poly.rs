use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    comms::{channel, SynthComms, UiHandle},
    config::EngineConfig,
    dsp::SawVoice,
    error::{ConfigError, StateError},
    io::{EventSink, HostEvent, NoteKey, OutputEventKind, StereoBuffer},
    param::{ParamId, ParamTable, ParamValues, PatchState, PATCH_STATE_VERSION},
    synth::{
        allocator::VoiceAllocator,
        dispatch::{DispatchStats, EventDispatcher, Timeline},
        render::BlockRenderer,
        VoiceDsp, VoiceFactory,
    },
};

/// Whether the host needs to keep calling `process` when no events arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Voices are sounding.
    Continue,
    /// Silent until the next event.
    Sleep,
}

/// Voice capabilities advertised to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceInfo {
    pub capacity: usize,
    pub supports_overlapping_notes: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthStats {
    pub dispatch: DispatchStats,
    pub voices_stolen: u64,
    /// Ended or stolen notes that did not fit the per-block report lists.
    pub lost_note_reports: u64,
    /// Messages to the control surface lost to a full queue.
    pub ui_messages_dropped: u64,
}

/// The host-facing instrument.
///
/// Owns the parameter cells and every voice; the control surface reaches it
/// only through the [`UiHandle`] returned by [`PolySynth::new`].
pub struct PolySynth<D: VoiceDsp = SawVoice> {
    table: Arc<ParamTable>,
    values: ParamValues,
    voices: VoiceAllocator<D>,
    dispatcher: EventDispatcher,
    renderer: BlockRenderer,
    timeline: Timeline,
    comms: SynthComms,
    sample_rate: f32,
    active: bool,
}

impl PolySynth<SawVoice> {
    pub fn new(config: EngineConfig) -> Result<(Self, UiHandle), ConfigError> {
        Self::with_factory(config, &SawVoice::new)
    }
}

impl<D: VoiceDsp> PolySynth<D> {
    /// Build an engine whose voices come from `factory`. All allocation
    /// happens here.
    pub fn with_factory<F>(
        config: EngineConfig,
        factory: &F,
    ) -> Result<(Self, UiHandle), ConfigError>
    where
        F: VoiceFactory<Voice = D>,
    {
        config.validate()?;

        let table = Arc::new(ParamTable::new());
        let (comms, ui) = channel(config.queue_capacity, Arc::clone(&table));
        let voices = VoiceAllocator::new(
            config.max_voices,
            factory,
            config.sample_rate,
            config.steal_policy,
            config.overlapping_notes,
            config.timeline_capacity,
        );

        info!(
            "polysynth: {} voices ({:?} stealing, overlapping notes {}), queues of {} slots",
            config.max_voices,
            config.steal_policy,
            if config.overlapping_notes { "on" } else { "off" },
            config.queue_capacity,
        );

        let synth = Self {
            values: table.defaults(),
            dispatcher: EventDispatcher::new(Arc::clone(&table)),
            table,
            voices,
            renderer: BlockRenderer::new(),
            // A full UI queue always fits beside a block's worth of host events.
            timeline: Timeline::with_capacity(config.queue_capacity + config.timeline_capacity),
            comms,
            sample_rate: config.sample_rate,
            active: false,
        };
        Ok((synth, ui))
    }

    /// Prepare for rendering at `sample_rate`. Any sounding voice is cut.
    pub fn activate(
        &mut self,
        sample_rate: f64,
        min_frames: u32,
        max_frames: u32,
    ) -> Result<(), ConfigError> {
        let rate = sample_rate as f32;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError::SampleRate(rate));
        }

        self.sample_rate = rate;
        self.voices.reset();
        self.voices.set_sample_rate(rate);
        self.active = true;
        info!(
            "activated at {} Hz, blocks of {}..={} frames",
            rate, min_frames, max_frames
        );
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.voices.reset();
        self.active = false;
        info!("deactivated");
    }

    pub fn start_processing(&mut self) {
        self.comms.snapshot().set_processing(true);
        debug!("processing started");
    }

    pub fn stop_processing(&mut self) {
        self.comms.snapshot().set_processing(false);
        let stats = self.stats();
        debug!("processing stopped: {:?}", stats);
        if stats.ui_messages_dropped > 0 {
            warn!(
                "{} messages to the control surface were dropped",
                stats.ui_messages_dropped
            );
        }
    }

    /// Render one block.
    ///
    /// Queued UI messages and `events` are applied at their offsets, `output`
    /// is overwritten, and notes that stopped sounding are reported to `sink`
    /// as `NoteEnd` on the block's last frame.
    pub fn process<S>(
        &mut self,
        events: &[HostEvent],
        output: &mut StereoBuffer<'_>,
        sink: &mut S,
    ) -> ProcessStatus
    where
        S: EventSink + ?Sized,
    {
        let frames = output.frames();
        let PolySynth {
            values,
            voices,
            dispatcher,
            renderer,
            timeline,
            comms,
            ..
        } = &mut *self;

        if comms.snapshot().take_refresh_request() {
            dispatcher.send_all_values(values, comms);
        }

        dispatcher.collect(events, &mut comms.from_ui, timeline, frames);
        renderer.render(output, timeline.events(), voices, |ev, voices| {
            dispatcher.apply(ev, values, voices, comms, sink);
        });

        report_note_ends(voices, dispatcher, sink, frames.saturating_sub(1) as u32);
        self.publish()
    }

    /// Apply events without rendering audio, e.g. while the host is stopped.
    pub fn params_flush<S>(&mut self, events: &[HostEvent], sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let PolySynth {
            values,
            voices,
            dispatcher,
            timeline,
            comms,
            ..
        } = &mut *self;

        if comms.snapshot().take_refresh_request() {
            dispatcher.send_all_values(values, comms);
        }

        dispatcher.collect(events, &mut comms.from_ui, timeline, 0);
        for ev in timeline.events() {
            dispatcher.apply(ev, values, voices, comms, sink);
        }

        report_note_ends(voices, dispatcher, sink, 0);
        self.publish();
        debug!("flushed {} events", self.timeline.len());
    }

    fn publish(&self) -> ProcessStatus {
        let sounding = self.voices.sounding_count();
        let snapshot = self.comms.snapshot();
        snapshot.set_polyphony(sounding);
        self.comms.publish_drops();

        if sounding > 0 {
            ProcessStatus::Continue
        } else {
            ProcessStatus::Sleep
        }
    }

    pub fn voice_info(&self) -> VoiceInfo {
        VoiceInfo {
            capacity: self.voices.capacity(),
            supports_overlapping_notes: self.voices.overlapping_notes(),
        }
    }

    pub fn param_value(&self, id: ParamId) -> f64 {
        self.values.get(id)
    }

    pub fn params(&self) -> &ParamValues {
        &self.values
    }

    pub fn table(&self) -> &ParamTable {
        &self.table
    }

    pub fn voices(&self) -> &VoiceAllocator<D> {
        &self.voices
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stats(&self) -> SynthStats {
        SynthStats {
            dispatch: self.dispatcher.stats(),
            voices_stolen: self.voices.stolen(),
            lost_note_reports: self.voices.report_overflow(),
            ui_messages_dropped: self.comms.dropped(),
        }
    }

    pub fn save_state(&self) -> PatchState {
        PatchState::capture(&self.table, &self.values)
    }

    /// Restore parameter values from `state`. Returns how many were applied.
    ///
    /// Ids this build does not know are skipped. Nothing is applied if any
    /// known value is invalid. The control surface is asked to refresh.
    pub fn load_state(&mut self, state: &PatchState) -> Result<usize, StateError> {
        if state.version != PATCH_STATE_VERSION {
            return Err(StateError::Version {
                found: state.version,
                expected: PATCH_STATE_VERSION,
            });
        }

        let mut loaded = self.values;
        let mut applied = 0;
        for record in &state.params {
            let Some(info) = self.table.lookup(record.id) else {
                warn!("skipping unknown parameter {} in patch", record.id);
                continue;
            };
            let value = info
                .sanitize(record.value)
                .ok_or(StateError::NonFinite { id: record.id })?;
            loaded.set(info.id, value);
            applied += 1;
        }

        self.values = loaded;
        self.voices.apply_params(&self.values);
        self.comms.snapshot().request_refresh();
        info!("loaded {} of {} parameters from patch", applied, state.params.len());
        Ok(applied)
    }
}

/// Tell the host about every note that stopped sounding this block.
fn report_note_ends<D, S>(
    voices: &mut VoiceAllocator<D>,
    dispatcher: &mut EventDispatcher,
    sink: &mut S,
    offset: u32,
) where
    D: VoiceDsp,
    S: EventSink + ?Sized,
{
    let mut end = |note: NoteKey| dispatcher.emit(sink, offset, OutputEventKind::NoteEnd { note });
    voices.drain_terminated().for_each(&mut end);
    voices.drain_ended().for_each(&mut end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comms::ToUi,
        io::{AudioOutput, OutputEvent},
        synth::test_voice::TestVoice,
    };

    fn synth(voices: usize) -> (PolySynth<TestVoice>, UiHandle) {
        let config = EngineConfig::default().max_voices(voices).queue_capacity(64);
        PolySynth::with_factory(config, &|| TestVoice::with_tail(2)).expect("valid config")
    }

    fn note(key: i16) -> NoteKey {
        NoteKey::new(0, 0, key, key as i32)
    }

    #[test]
    fn rejects_bad_config() {
        let config = EngineConfig::default().max_voices(0);
        assert!(PolySynth::new(config).is_err());
    }

    #[test]
    fn voice_info_matches_the_pool() {
        let (synth, _ui) = synth(8);
        assert_eq!(
            synth.voice_info(),
            VoiceInfo {
                capacity: 8,
                supports_overlapping_notes: true
            }
        );
    }

    #[test]
    fn processing_flag_bumps_the_snapshot() {
        let (mut synth, ui) = synth(2);
        let before = ui.snapshot().update_count();
        synth.start_processing();
        assert!(ui.snapshot().is_processing());
        synth.stop_processing();
        assert!(!ui.snapshot().is_processing());
        assert_eq!(ui.snapshot().update_count(), before + 2);
    }

    #[test]
    fn stolen_note_is_reported_to_host_and_ui() {
        let (mut synth, mut ui) = synth(1);
        let mut out = AudioOutput::with_frames(16);
        let mut events: Vec<OutputEvent> = Vec::new();
        let host = [
            HostEvent::note_on(0, note(60), 1.0),
            HostEvent::note_on(4, note(62), 1.0),
        ];

        let status = synth.process(&host, &mut out.as_stereo(), &mut events);

        assert_eq!(status, ProcessStatus::Continue);
        assert_eq!(
            events,
            vec![OutputEvent {
                offset: 15,
                kind: OutputEventKind::NoteEnd { note: note(60) }
            }]
        );
        let msgs: Vec<_> = std::iter::from_fn(|| ui.try_recv()).collect();
        assert_eq!(
            msgs,
            vec![
                ToUi::NoteOn { key: 60 },
                ToUi::NoteOff { key: 60 },
                ToUi::NoteOn { key: 62 },
            ]
        );
        assert_eq!(synth.stats().voices_stolen, 1);
        assert_eq!(ui.snapshot().polyphony(), 1);
    }

    #[test]
    fn released_voice_ends_and_synth_sleeps() {
        let (mut synth, _ui) = synth(4);
        let mut out = AudioOutput::with_frames(32);
        let mut events: Vec<OutputEvent> = Vec::new();
        let host = [
            HostEvent::note_on(0, note(60), 1.0),
            HostEvent::note_off(8, note(60)),
        ];

        let status = synth.process(&host, &mut out.as_stereo(), &mut events);
        assert_eq!(status, ProcessStatus::Sleep);
        assert_eq!(events.len(), 1);
        assert!(out.left[20..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn flush_applies_params_without_audio() {
        let (mut synth, mut ui) = synth(2);
        ui.adjust(ParamId::UnisonCount, 5.0);
        let mut events: Vec<OutputEvent> = Vec::new();
        synth.params_flush(&[HostEvent::param_value(7, ParamId::Cutoff.raw(), 100.0)], &mut events);

        assert_eq!(synth.param_value(ParamId::UnisonCount), 5.0);
        assert_eq!(synth.param_value(ParamId::Cutoff), 100.0);
        // The UI edit is echoed to the host.
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn refresh_request_resends_all_values() {
        let (mut synth, mut ui) = synth(2);
        ui.request_refresh();
        let mut out = AudioOutput::with_frames(8);
        synth.process(&[], &mut out.as_stereo(), &mut Vec::<OutputEvent>::new());

        let msgs: Vec<_> = std::iter::from_fn(|| ui.try_recv()).collect();
        assert_eq!(msgs.len(), crate::param::PARAM_COUNT);
        assert!(msgs
            .iter()
            .all(|m| matches!(m, ToUi::ParamValue { .. })));
    }

    #[test]
    fn state_load_rejects_other_versions() {
        let (mut synth, _ui) = synth(2);
        let mut state = synth.save_state();
        state.version = 99;
        assert_eq!(
            synth.load_state(&state),
            Err(StateError::Version {
                found: 99,
                expected: PATCH_STATE_VERSION
            })
        );
    }

    #[test]
    fn state_load_is_all_or_nothing() {
        let (mut synth, _ui) = synth(2);
        let mut state = synth.save_state();
        state.params[0].value = 4.0;
        state.params[1].value = f64::INFINITY;

        assert!(matches!(
            synth.load_state(&state),
            Err(StateError::NonFinite { .. })
        ));
        assert_eq!(synth.params(), &synth.table().defaults());
    }

    #[test]
    fn activate_rejects_bad_rates_and_cuts_voices() {
        let (mut synth, _ui) = synth(2);
        assert!(synth.activate(0.0, 1, 512).is_err());

        let mut out = AudioOutput::with_frames(8);
        synth.process(
            &[HostEvent::note_on(0, note(60), 1.0)],
            &mut out.as_stereo(),
            &mut Vec::<OutputEvent>::new(),
        );
        assert_eq!(synth.voices().sounding_count(), 1);

        synth.activate(44_100.0, 1, 512).expect("valid rate");
        assert_eq!(synth.voices().sounding_count(), 0);
        assert_eq!(synth.sample_rate(), 44_100.0);
    }
}
