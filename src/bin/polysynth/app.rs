//! Audio host stand-in: a cpal output stream drives `PolySynth::process`.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};
use rtrb::RingBuffer;

use polysynth::{
    io::{HostEvent, OutputEventList, StereoBuffer},
    EngineConfig, PolySynth, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// Keyboard notes that can wait for the next audio callback.
const NOTE_QUEUE_SIZE: usize = 256;
/// Peak readings buffered for the level meter.
const METER_QUEUE_SIZE: usize = 64;

pub struct Polysynth {
    config: EngineConfig,
}

impl Polysynth {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn voices(mut self, voices: usize) -> Self {
        self.config = self.config.max_voices(voices);
        self
    }

    /// Open the default output device and hand the terminal to the UI until
    /// the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (mut synth, ui) = PolySynth::new(self.config.sample_rate(sample_rate))?;
        synth.activate(sample_rate as f64, 1, MAX_BLOCK_SIZE as u32)?;
        synth.start_processing();
        info!("output: {} Hz, {} channels", sample_rate, channels);

        let (note_tx, mut note_rx) = RingBuffer::<HostEvent>::new(NOTE_QUEUE_SIZE);
        let (mut meter_tx, meter_rx) = RingBuffer::<f32>::new(METER_QUEUE_SIZE);

        // Everything the callback touches is allocated here.
        let mut events: Vec<HostEvent> = Vec::with_capacity(NOTE_QUEUE_SIZE);
        let mut output_events = OutputEventList::with_capacity(NOTE_QUEUE_SIZE);
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                let mut peak = 0.0f32;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    // Keyboard notes land at the start of the next block.
                    events.clear();
                    while events.len() < events.capacity() {
                        match note_rx.pop() {
                            Ok(ev) => events.push(HostEvent { offset: 0, ..ev }),
                            Err(_) => break,
                        }
                    }

                    output_events.clear();
                    let mut out = StereoBuffer::new(&mut left[..frames], &mut right[..frames]);
                    synth.process(&events, &mut out, &mut output_events);

                    let out_off = frames_written * channels;
                    for i in 0..frames {
                        let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                        for (ch, sample) in frame.iter_mut().enumerate() {
                            *sample = if ch % 2 == 0 { left[i] } else { right[i] };
                        }
                        peak = peak.max(left[i].abs()).max(right[i].abs());
                    }

                    frames_written += frames;
                }

                let _ = meter_tx.push(peak);
            },
            |err| error!("audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(ui, note_tx, meter_rx, sample_rate).run(&mut terminal);
        ratatui::restore();
        result
    }
}

impl Default for Polysynth {
    fn default() -> Self {
        Self::new()
    }
}
