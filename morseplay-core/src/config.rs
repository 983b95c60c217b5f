//! Synthesis parameters shared by the tone generator, sequencer and decoder.

use serde::{Deserialize, Serialize};

use crate::{
    buffering::pcm::MAX_DURATION_MS,
    error::{MorseError, Result},
};

/// What the sequencer does with characters other than `.`, `-` and space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSymbolPolicy {
    /// Drop the character and log a warning.
    Skip,
    /// Fail with `MorseError::UnrecognizedSymbol`.
    #[default]
    Reject,
}

/// Configuration for `ToneGenerator`, `Sequencer` and `MorseDecoder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SynthConfig {
    /// Output sample rate (Hz). Default: 44100.
    pub sample_rate: u32,
    /// Tone frequency (Hz). Default: 1000.
    pub frequency_hz: f64,
    /// Dot tone length (ms). Default: 200.
    pub dot_ms: f64,
    /// Dash tone length (ms). Default: 600.
    pub dash_ms: f64,
    /// Silence after every dot or dash (ms). Default: 200.
    pub symbol_gap_ms: f64,
    /// Silence emitted for a space (ms). Default: 600.
    pub word_gap_ms: f64,
    /// Handling of unrecognized input characters. Default: `Reject`.
    pub unknown_symbols: UnknownSymbolPolicy,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frequency_hz: 1_000.0,
            dot_ms: 200.0,
            dash_ms: 600.0,
            symbol_gap_ms: 200.0,
            word_gap_ms: 600.0,
            unknown_symbols: UnknownSymbolPolicy::Reject,
        }
    }
}

impl SynthConfig {
    /// Half the sample rate: the first tone frequency that cannot be rendered.
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Check every field, returning the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MorseError::InvalidSampleRate(self.sample_rate));
        }
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(MorseError::InvalidFrequency(self.frequency_hz));
        }
        // At or above Nyquist every sample lands on (or aliases through) a zero crossing.
        if self.frequency_hz >= self.nyquist_hz() {
            return Err(MorseError::InvalidFrequency(self.frequency_hz));
        }
        for ms in [
            self.dot_ms,
            self.dash_ms,
            self.symbol_gap_ms,
            self.word_gap_ms,
        ] {
            if !ms.is_finite() || !(0.0..=MAX_DURATION_MS).contains(&ms) {
                return Err(MorseError::InvalidDuration(ms));
            }
        }
        Ok(())
    }
}
