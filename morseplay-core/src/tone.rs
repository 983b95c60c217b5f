//! Fixed-frequency sine tone generator.
//!
//! Sample `i` of an `n`-sample tone lasting `d` seconds is
//! `round(32767 · sin(2π · f · i·d/n))`: the time axis is evenly spaced over
//! `[0, d)` with the endpoint excluded. Every tone starts at phase zero, so
//! consecutive tones are not phase-continuous.

use std::f64::consts::TAU;

use crate::{
    buffering::pcm::{sample_count, PcmBuffer},
    error::{MorseError, Result},
};

/// Peak amplitude of a full-scale tone.
pub const FULL_SCALE: f64 = i16::MAX as f64;

/// Renders sine tones at a fixed sample rate.
#[derive(Debug, Clone, Copy)]
pub struct ToneGenerator {
    sample_rate: u32,
}

impl ToneGenerator {
    /// # Errors
    /// `MorseError::InvalidSampleRate` for a zero rate.
    pub fn new(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(MorseError::InvalidSampleRate(sample_rate));
        }
        Ok(Self { sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Generate `duration_ms` of a full-amplitude sine at `frequency_hz`.
    ///
    /// A zero duration yields an empty buffer.
    ///
    /// # Errors
    /// - `MorseError::InvalidFrequency` if the frequency is not finite and positive.
    /// - `MorseError::InvalidDuration` if the duration is negative or not finite.
    pub fn generate(&self, frequency_hz: f64, duration_ms: f64) -> Result<PcmBuffer> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(MorseError::InvalidFrequency(frequency_hz));
        }
        let len = sample_count(self.sample_rate, duration_ms)?;
        if len == 0 {
            return Ok(PcmBuffer::empty(self.sample_rate));
        }

        let step = duration_ms / 1000.0 / len as f64;
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 * step;
                (FULL_SCALE * (TAU * frequency_hz * t).sin()).round() as i16
            })
            .collect();

        Ok(PcmBuffer::new(samples, self.sample_rate))
    }
}
