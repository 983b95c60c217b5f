//! Mono 16-bit PCM buffer produced by the tone generator and the sequencer.

use crate::error::{MorseError, Result};

/// Bit depth of every `PcmBuffer`.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Channel count of every `PcmBuffer`.
pub const CHANNELS: u16 = 1;

/// Longest single tone, silence or recording accepted (10 minutes).
pub const MAX_DURATION_MS: f64 = 600_000.0;

/// A contiguous block of mono signed 16-bit samples at a known sample rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    /// Mono i16 samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz (e.g. 44100).
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Quantise normalised f32 samples, clipping anything outside [-1.0, 1.0].
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        let samples = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// An empty buffer at `sample_rate`.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// A buffer of digital silence lasting `duration_ms`.
    ///
    /// # Errors
    /// `MorseError::InvalidSampleRate` for a zero rate,
    /// `MorseError::InvalidDuration` for a negative, non-finite or oversized duration.
    pub fn silent(duration_ms: f64, sample_rate: u32) -> Result<Self> {
        let len = sample_count(sample_rate, duration_ms)?;
        Ok(Self::new(vec![0; len], sample_rate))
    }

    /// Append `other` end-to-end. No cross-fade is applied.
    ///
    /// # Errors
    /// `MorseError::SampleRateMismatch` if the two buffers disagree on rate.
    pub fn append(&mut self, other: &PcmBuffer) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(MorseError::SampleRateMismatch {
                expected: self.sample_rate,
                found: other.sample_rate,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the duration of this buffer in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn channels(&self) -> u16 {
        CHANNELS
    }

    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    /// Samples normalised to f32 in [-1.0, 1.0).
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

/// Number of samples covering `duration_ms` at `sample_rate`, rounded to the
/// nearest sample.
///
/// # Errors
/// `MorseError::InvalidSampleRate` for a zero rate,
/// `MorseError::InvalidDuration` for a negative or non-finite duration, or one
/// longer than `MAX_DURATION_MS`.
pub fn sample_count(sample_rate: u32, duration_ms: f64) -> Result<usize> {
    if sample_rate == 0 {
        return Err(MorseError::InvalidSampleRate(sample_rate));
    }
    if !duration_ms.is_finite() || !(0.0..=MAX_DURATION_MS).contains(&duration_ms) {
        return Err(MorseError::InvalidDuration(duration_ms));
    }
    Ok((sample_rate as f64 * duration_ms / 1000.0).round() as usize)
}
