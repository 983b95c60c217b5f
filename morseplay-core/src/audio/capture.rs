//! Fixed-length microphone recording via cpal, for decoding keyed Morse.
//!
//! The input callback downmixes each frame to mono and `try_push`es it into
//! an SPSC ring sized for the whole take; overflow is counted, never blocked
//! on. Once the requested time has passed the stream is dropped, the ring is
//! drained on the caller's thread and the take is resampled to the synthesis
//! rate so `MorseDecoder` sees the same rate it renders at.
//!
//! As with playback, the `!Send` stream never leaves `CpalCapture::record`.

#[cfg(feature = "audio-cpal")]
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

#[cfg(feature = "audio-cpal")]
use cpal::{
    traits::{DeviceTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
};
#[cfg(feature = "audio-cpal")]
use parking_lot::Mutex;
use tracing::info;
#[cfg(feature = "audio-cpal")]
use tracing::{error, warn};

#[cfg(feature = "audio-cpal")]
use super::{
    device::{self, Direction},
    resample,
};
#[cfg(feature = "audio-cpal")]
use crate::buffering::{create_sample_ring, Consumer, Producer, SampleProducer};
use crate::{
    buffering::pcm::{sample_count, PcmBuffer},
    error::{MorseError, Result},
};

/// Extra ring space beyond the requested length, in seconds of device audio.
#[cfg(feature = "audio-cpal")]
const RING_SLACK_SECS: f64 = 1.0;

fn unavailable(detail: impl ToString) -> MorseError {
    MorseError::CaptureUnavailable(detail.to_string())
}

/// Blocking fixed-duration recording from the system audio input.
#[derive(Debug, Clone, Default)]
pub struct CpalCapture {
    /// Input device name to prefer over the system default.
    preferred_device: Option<String>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer the input device called `name`, falling back to the default.
    pub fn with_device(name: Option<String>) -> Self {
        Self {
            preferred_device: name,
        }
    }

    pub fn preferred_device(&self) -> Option<&str> {
        self.preferred_device.as_deref()
    }

    /// Record `duration_secs` of audio and return it as mono PCM at `target_rate`.
    ///
    /// Blocks the calling thread for the whole recording.
    ///
    /// # Errors
    /// - `MorseError::InvalidDuration` unless `0 < duration_secs ≤ 600`.
    /// - `MorseError::InvalidSampleRate` for a zero `target_rate`.
    /// - `MorseError::CaptureUnavailable` for any device, stream or resampling failure.
    pub fn record(&self, duration_secs: f64, target_rate: u32) -> Result<PcmBuffer> {
        let expected = sample_count(target_rate, duration_secs * 1000.0)?;
        if expected == 0 {
            return Err(MorseError::InvalidDuration(duration_secs * 1000.0));
        }

        let buffer = self
            .record_blocking(duration_secs, target_rate)
            .map_err(|e| match e {
                MorseError::CaptureUnavailable(_) => e,
                other => unavailable(other),
            })?;
        info!(
            samples = buffer.len(),
            duration_secs = buffer.duration_secs(),
            "recording complete"
        );
        Ok(buffer)
    }
}

#[cfg(feature = "audio-cpal")]
impl CpalCapture {
    fn record_blocking(&self, duration_secs: f64, target_rate: u32) -> Result<PcmBuffer> {
        let host = cpal::default_host();
        let device =
            device::select_device(&host, Direction::Input, self.preferred_device.as_deref())
                .map_err(unavailable)?;

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening input device"
        );

        let supported = device.default_input_config().map_err(unavailable)?;
        let device_rate = supported.sample_rate().0;
        let channels = supported.channels();

        info!(device_rate, channels, "input config selected");

        let wanted = sample_count(device_rate, duration_secs * 1000.0)?;
        let slack = sample_count(device_rate, RING_SLACK_SECS * 1000.0)?;
        let (producer, mut consumer) = create_sample_ring(wanted + slack);

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(device_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let dropped = Arc::new(AtomicUsize::new(0));
        let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let overflow = Arc::clone(&dropped);
        let errors = Arc::clone(&stream_error);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, producer, overflow, errors),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, producer, overflow, errors),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, producer, overflow, errors),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, producer, overflow, errors),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, producer, overflow, errors),
            fmt => {
                return Err(unavailable(format!("unsupported sample format: {fmt:?}")));
            }
        }?;

        stream.play().map_err(unavailable)?;
        info!(duration_secs, "recording");
        std::thread::sleep(Duration::from_secs_f64(duration_secs));
        drop(stream);

        if let Some(detail) = stream_error.lock().take() {
            return Err(unavailable(detail));
        }
        let lost = dropped.load(Ordering::Relaxed);
        if lost > 0 {
            warn!(lost, "capture ring full: dropped input frames");
        }

        let mut samples: Vec<f32> = consumer.pop_iter().collect();
        samples.truncate(wanted);
        if samples.len() < wanted {
            warn!(
                got = samples.len(),
                wanted, "input device delivered less audio than requested"
            );
        }

        let samples = resample::convert_samples(samples, device_rate, target_rate)?;
        Ok(PcmBuffer::from_f32(&samples, target_rate))
    }
}

/// Stub when the `audio-cpal` feature is disabled.
#[cfg(not(feature = "audio-cpal"))]
impl CpalCapture {
    fn record_blocking(&self, _duration_secs: f64, _target_rate: u32) -> Result<PcmBuffer> {
        Err(unavailable("compiled without audio-cpal feature"))
    }
}

/// Average one interleaved frame down to a single normalised sample.
#[cfg(feature = "audio-cpal")]
fn mix_to_mono<T>(frame: &[T]) -> f32
where
    T: Sample,
    f32: FromSample<T>,
{
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
    sum / frame.len() as f32
}

/// Build an input stream that downmixes to mono and feeds the ring.
#[cfg(feature = "audio-cpal")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: SampleProducer,
    dropped: Arc<AtomicUsize>,
    stream_error: Arc<Mutex<Option<String>>>,
) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _info: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    if producer.try_push(mix_to_mono(frame)).is_err() {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            },
            move |err| {
                error!("audio input stream error: {err}");
                *stream_error.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(unavailable)
}
