//! Audio sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! ## Design
//!
//! Morse buffers are synthesised at 44.1 kHz, while many output devices only
//! accept their native rate (commonly 48 kHz). `RateConverter` bridges that
//! gap on the caller thread before the samples reach the output ring, and in
//! the other direction for recordings taken at the input device's rate.
//!
//! When source rate == device rate, `RateConverter` is a passthrough and no
//! rubato session is created at all.
//!
//! ## Usage
//!
//! ```ignore
//! let mut rc = RateConverter::new(44_100, 48_000, 1024)?;
//! let mut out = rc.process(&samples)?;
//! out.extend(rc.finish()?);
//! ```

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::{
    buffering::pcm::PcmBuffer,
    error::{MorseError, Result},
};

/// Input frames handed to rubato per call by `convert_buffer`.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Converts f32 mono audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Accumulation buffer — holds partial input chunks between calls.
    input_buf: Vec<f32>,
    /// How many input samples rubato expects per process call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Parameters
    /// - `source_rate`: Sample rate of the incoming audio (Hz).
    /// - `target_rate`: Sample rate expected by the device (Hz).
    /// - `chunk_size`: Input frame count per rubato call (e.g. `1024`).
    ///
    /// # Errors
    /// Returns `MorseError::InvalidSampleRate` for a zero rate and
    /// `MorseError::Resample` if rubato fails to initialise.
    pub fn new(source_rate: u32, target_rate: u32, chunk_size: usize) -> Result<Self> {
        for rate in [source_rate, target_rate] {
            if rate == 0 {
                return Err(MorseError::InvalidSampleRate(rate));
            }
        }

        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = target_rate as f64 / source_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio — no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| MorseError::Resample(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        tracing::info!(
            source_rate,
            target_rate,
            chunk_size,
            max_out,
            "resampling enabled from={} to={}",
            source_rate,
            target_rate
        );

        Ok(Self {
            resampler: Some(resampler),
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
        })
    }

    /// Process incoming samples, returning resampled output (may be empty).
    ///
    /// Samples are accumulated internally until a full `chunk_size` block is
    /// available for rubato. Any remainder is kept for the next call or for
    /// `finish`.
    ///
    /// In passthrough mode (same rates), input is returned directly.
    ///
    /// # Errors
    /// `MorseError::Resample` if rubato rejects a chunk. The offending chunk
    /// is still consumed so a retry does not see it twice.
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let Some(ref mut resampler) = self.resampler else {
            return Ok(samples.to_vec());
        };

        self.input_buf.extend_from_slice(samples);

        let mut result = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            let input_slice = &self.input_buf[..self.chunk_size];
            let outcome = resampler.process_into_buffer(&[input_slice], &mut self.output_buf, None);
            self.input_buf.drain(..self.chunk_size);

            let (_consumed, produced) =
                outcome.map_err(|e| MorseError::Resample(format!("process: {e}")))?;
            result.extend_from_slice(&self.output_buf[0][..produced]);
        }

        Ok(result)
    }

    /// Flush the buffered remainder plus the resampler's internal delay line.
    ///
    /// # Errors
    /// `MorseError::Resample` if rubato rejects the partial chunk or the flush.
    pub fn finish(&mut self) -> Result<Vec<f32>> {
        let Some(ref mut resampler) = self.resampler else {
            return Ok(Vec::new());
        };

        let mut result = Vec::new();

        if !self.input_buf.is_empty() {
            let tail: [&[f32]; 1] = [self.input_buf.as_slice()];
            let outcome =
                resampler.process_partial_into_buffer(Some(&tail[..]), &mut self.output_buf, None);
            self.input_buf.clear();

            let (_consumed, produced) =
                outcome.map_err(|e| MorseError::Resample(format!("flush: {e}")))?;
            result.extend_from_slice(&self.output_buf[0][..produced]);
        }

        let (_consumed, produced) = resampler
            .process_partial_into_buffer(None::<&[&[f32]]>, &mut self.output_buf, None)
            .map_err(|e| MorseError::Resample(format!("flush: {e}")))?;
        result.extend_from_slice(&self.output_buf[0][..produced]);

        Ok(result)
    }

    /// Output frames of latency introduced by the resampler (0 in passthrough).
    pub fn output_delay(&self) -> usize {
        self.resampler
            .as_ref()
            .map(|r| r.output_delay())
            .unwrap_or(0)
    }

    /// Returns `true` when source rate == target rate (no resampling occurs).
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}

/// Convert a whole PCM buffer to normalised f32 samples at `target_rate`.
///
/// The result is delay-compensated and exactly
/// `round(len · target_rate / source_rate)` samples long.
pub fn convert_buffer(buffer: &PcmBuffer, target_rate: u32) -> Result<Vec<f32>> {
    convert_samples(buffer.to_f32(), buffer.sample_rate, target_rate)
}

/// Resample a complete mono recording from `source_rate` to `target_rate`.
///
/// # Errors
/// `MorseError::InvalidSampleRate` for a zero rate, `MorseError::Resample`
/// if rubato fails or returns fewer samples than the ratio calls for.
pub fn convert_samples(samples: Vec<f32>, source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    let mut rc = RateConverter::new(source_rate, target_rate, DEFAULT_CHUNK_SIZE)?;
    if rc.is_passthrough() {
        return Ok(samples);
    }

    let expected =
        (samples.len() as f64 * target_rate as f64 / source_rate as f64).round() as usize;
    let delay = rc.output_delay();

    let mut out = rc.process(&samples)?;
    out.extend(rc.finish()?);

    let out: Vec<f32> = out.into_iter().skip(delay).take(expected).collect();
    if out.len() < expected {
        return Err(MorseError::Resample(format!(
            "short output: {} of {expected} samples",
            out.len()
        )));
    }
    Ok(out)
}
