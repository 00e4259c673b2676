use crate::settings::config::ChimeConfig;
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::f32::consts::TAU;
use std::sync::mpsc;

/// Decay rate of the chime envelope, per second
const CHIME_DECAY: f32 = 5.0;

/// One-shot sound played on every phase change
pub trait AudioCue {
	/// Fire and forget. Must not panic or block when the sound can't play.
	fn play(&self);
}

/// Cue used when no output device is available
pub struct SilentCue;

impl AudioCue for SilentCue {
	fn play(&self) {
		log::trace!("Silent cue");
	}
}

/// Decaying sine chime on the default output device
pub struct ChimeCue {
	/// Each message starts a new voice in the stream callback
	trigger_tx: mpsc::Sender<()>,
	/// Active cpal stream (must be kept alive)
	_stream: cpal::Stream,
}

impl ChimeCue {
	pub fn new(chime: &ChimeConfig) -> anyhow::Result<Self> {
		let host = cpal::default_host();
		let device = host
			.default_output_device()
			.context("no default audio output device")?;
		let name = device.name().unwrap_or_else(|_| "unknown".into());
		log::info!("Using audio output: {}", name);

		let config = device
			.default_output_config()
			.context("querying output config")?;
		log::info!(
			"Audio config: {} channels, {}Hz, {:?}",
			config.channels(),
			config.sample_rate().0,
			config.sample_format()
		);

		let (trigger_tx, trigger_rx) = mpsc::channel();
		let voices = ChimeVoices::new(chime, config.sample_rate().0 as f32, trigger_rx);
		let format = config.sample_format();
		let config: cpal::StreamConfig = config.into();

		let stream = match format {
			cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, voices)?,
			cpal::SampleFormat::F64 => build_stream::<f64>(&device, &config, voices)?,
			cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, voices)?,
			cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, voices)?,
			cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, voices)?,
			cpal::SampleFormat::U8 => build_stream::<u8>(&device, &config, voices)?,
			other => anyhow::bail!("unsupported sample format {:?}", other),
		};
		stream.play().context("starting output stream")?;

		Ok(Self {
			trigger_tx,
			_stream: stream,
		})
	}
}

fn build_stream<T>(
	device: &cpal::Device,
	config: &cpal::StreamConfig,
	mut voices: ChimeVoices,
) -> anyhow::Result<cpal::Stream>
where
	T: SizedSample + FromSample<f32>,
{
	let channels = config.channels as usize;
	device
		.build_output_stream(
			config,
			move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
				voices.fill(data, channels);
			},
			move |err| {
				log::error!("Audio stream error: {}", err);
			},
			None,
		)
		.context("building output stream")
}

impl AudioCue for ChimeCue {
	fn play(&self) {
		if self.trigger_tx.send(()).is_err() {
			log::warn!("Chime stream is gone, cue skipped");
		}
	}
}

/// Chime if the output device works, silence otherwise
pub fn open_cue(chime: &ChimeConfig) -> Box<dyn AudioCue> {
	match ChimeCue::new(chime) {
		Ok(cue) => Box::new(cue),
		Err(e) => {
			log::warn!("Audio cues disabled: {:#}", e);
			Box::new(SilentCue)
		}
	}
}

/// Mixer state owned by the stream callback. Overlapping chimes add up.
struct ChimeVoices {
	trigger_rx: mpsc::Receiver<()>,
	/// Sample position of each sounding voice
	voices: Vec<usize>,
	frequency_hz: f32,
	volume: f32,
	sample_rate: f32,
	length: usize,
}

impl ChimeVoices {
	fn new(chime: &ChimeConfig, sample_rate: f32, trigger_rx: mpsc::Receiver<()>) -> Self {
		Self {
			trigger_rx,
			voices: Vec::new(),
			frequency_hz: chime.frequency_hz,
			volume: chime.volume,
			sample_rate,
			length: (sample_rate * chime.duration_ms as f32 / 1000.0) as usize,
		}
	}

	/// Render the next frames in the device's sample type
	fn fill<T: Sample + FromSample<f32>>(&mut self, data: &mut [T], channels: usize) {
		while self.trigger_rx.try_recv().is_ok() {
			self.voices.push(0);
		}

		for frame in data.chunks_mut(channels.max(1)) {
			let sample = T::from_sample(self.next_sample());
			for out in frame.iter_mut() {
				*out = sample;
			}
		}

		let length = self.length;
		self.voices.retain(|pos| *pos < length);
	}

	fn next_sample(&mut self) -> f32 {
		let mut mixed = 0.0;
		for pos in self.voices.iter_mut() {
			if *pos >= self.length {
				continue;
			}
			let t = *pos as f32 / self.sample_rate;
			mixed += (TAU * self.frequency_hz * t).sin() * (-CHIME_DECAY * t).exp();
			*pos += 1;
		}
		(mixed * self.volume).clamp(-1.0, 1.0)
	}
}
