//! Audio playback via cpal backend. Recording lives in `capture`.
//!
//! # Design constraints
//!
//! The cpal output callback runs on an OS audio thread at elevated priority.
//! It **must not**:
//! - Allocate heap memory
//! - Block on a mutex or condvar
//! - Perform I/O
//!
//! `CpalPlayback` satisfies that contract by converting and resampling the
//! whole buffer up front, pushing it into an SPSC ring, and letting the
//! callback `try_pop` from the consumer half. Completion is signalled back to
//! the caller over a bounded crossbeam channel.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio on
//! macOS). The stream is therefore created, awaited and dropped entirely
//! inside `CpalPlayback::play`, on the caller's thread.

pub mod capture;
pub mod device;
pub mod resample;

pub use capture::CpalCapture;
#[cfg(feature = "audio-cpal")]
use device::Direction;

#[cfg(feature = "audio-cpal")]
use std::{sync::Arc, time::Duration};

#[cfg(feature = "audio-cpal")]
use cpal::{
    traits::{DeviceTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
};
#[cfg(feature = "audio-cpal")]
use crossbeam_channel::{RecvTimeoutError, Sender};
#[cfg(feature = "audio-cpal")]
use parking_lot::Mutex;
use tracing::debug;
#[cfg(feature = "audio-cpal")]
use tracing::{error, info};

#[cfg(feature = "audio-cpal")]
use crate::buffering::{create_sample_ring, Consumer, Observer, Producer, SampleConsumer};
use crate::{
    buffering::pcm::PcmBuffer,
    error::{MorseError, Result},
    playback::PlaybackSink,
};

/// Extra time allowed beyond the buffer length before playback is declared stalled.
#[cfg(feature = "audio-cpal")]
const COMPLETION_SLACK: Duration = Duration::from_secs(2);

/// Pause after the ring drains so the device can flush its own buffer.
#[cfg(feature = "audio-cpal")]
const DRAIN_GRACE: Duration = Duration::from_millis(100);

fn unavailable(detail: impl ToString) -> MorseError {
    MorseError::PlaybackUnavailable(detail.to_string())
}

/// Blocking playback through the system audio output.
#[derive(Debug, Clone, Default)]
pub struct CpalPlayback {
    /// Output device name to prefer over the system default.
    preferred_device: Option<String>,
}

impl CpalPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer the output device called `name`, falling back to the default.
    pub fn with_device(name: Option<String>) -> Self {
        Self {
            preferred_device: name,
        }
    }

    pub fn preferred_device(&self) -> Option<&str> {
        self.preferred_device.as_deref()
    }
}

impl PlaybackSink for CpalPlayback {
    fn play(&mut self, buffer: &PcmBuffer) -> Result<()> {
        if buffer.is_empty() {
            debug!("empty buffer: nothing to play");
            return Ok(());
        }
        self.play_blocking(buffer).map_err(|e| match e {
            MorseError::PlaybackUnavailable(_) => e,
            other => unavailable(other),
        })
    }
}

#[cfg(feature = "audio-cpal")]
impl CpalPlayback {
    fn play_blocking(&self, buffer: &PcmBuffer) -> Result<()> {
        let host = cpal::default_host();
        let device =
            device::select_device(&host, Direction::Output, self.preferred_device.as_deref())
                .map_err(unavailable)?;

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening output device"
        );

        let supported = device.default_output_config().map_err(unavailable)?;
        let device_rate = supported.sample_rate().0;
        let channels = supported.channels();

        info!(device_rate, channels, "output config selected");

        let samples = resample::convert_buffer(buffer, device_rate)?;
        let (mut producer, consumer) = create_sample_ring(samples.len());
        producer.push_slice(&samples);

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(device_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let errors = Arc::clone(&stream_error);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, done_tx, errors),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, done_tx, errors),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, done_tx, errors),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, consumer, done_tx, errors),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, consumer, done_tx, errors),
            fmt => {
                return Err(unavailable(format!("unsupported sample format: {fmt:?}")));
            }
        }?;

        stream.play().map_err(unavailable)?;

        let timeout = Duration::from_secs_f64(buffer.duration_secs()) + COMPLETION_SLACK;
        match done_rx.recv_timeout(timeout) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {
                return Err(unavailable(format!(
                    "playback did not complete within {timeout:?}"
                )));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(unavailable("audio stream closed before completion"));
            }
        }

        if let Some(detail) = stream_error.lock().take() {
            return Err(unavailable(detail));
        }

        std::thread::sleep(DRAIN_GRACE);
        drop(stream);
        info!("playback complete");
        Ok(())
    }
}

/// Stub when the `audio-cpal` feature is disabled.
#[cfg(not(feature = "audio-cpal"))]
impl CpalPlayback {
    fn play_blocking(&self, _buffer: &PcmBuffer) -> Result<()> {
        Err(unavailable("compiled without audio-cpal feature"))
    }
}

/// Build an output stream that fans each mono sample out to every channel.
#[cfg(feature = "audio-cpal")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: SampleConsumer,
    done_tx: Sender<()>,
    stream_error: Arc<Mutex<Option<String>>>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value = consumer.try_pop().unwrap_or(0.0);
                    frame.fill(T::from_sample(value));
                }
                if consumer.is_empty() {
                    let _ = done_tx.try_send(());
                }
            },
            move |err| {
                error!("audio stream error: {err}");
                *stream_error.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_needs_no_device() {
        let mut sink = CpalPlayback::with_device(Some("does-not-exist".into()));
        assert!(sink.play(&PcmBuffer::empty(44_100)).is_ok());
        assert_eq!(sink.preferred_device(), Some("does-not-exist"));
    }

    #[test]
    fn non_playback_errors_are_folded() {
        let folded = match unavailable(MorseError::InvalidSampleRate(0)) {
            MorseError::PlaybackUnavailable(detail) => detail,
            other => panic!("unexpected error: {other}"),
        };
        assert!(folded.contains("invalid sample rate"));
    }
}
