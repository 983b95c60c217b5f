//! `MorseDecoder` — recovers the `.`/`-`/space string from a PCM buffer.
//!
//! ## Pipeline
//!
//! ```text
//! PcmBuffer → 10 ms frames → ToneDetector → run-length (Tone | Silence, ms)
//!           → tone run  < (dot+dash)/2 ? '.' : '-'
//!           → silence run after a tone: round((gap − symbol_gap) / word_gap) spaces
//!           → silence before the first tone: dropped
//! ```
//!
//! Timings and the tone frequency come from the same `SynthConfig` the
//! sequencer renders with. Silence before the first tone cannot be told apart
//! from a recording that simply started early, so it decodes to nothing.

use tracing::debug;

use super::{GoertzelDetector, ToneDecision, ToneDetector};
use crate::{
    buffering::pcm::{sample_count, PcmBuffer},
    config::SynthConfig,
    error::{MorseError, Result},
};

/// Analysis frame length (ms).
pub const FRAME_MS: f64 = 10.0;

pub struct MorseDecoder {
    config: SynthConfig,
    detector: Box<dyn ToneDetector>,
}

impl MorseDecoder {
    /// Decoder with a `GoertzelDetector` tuned to `config.frequency_hz`.
    pub fn new(config: SynthConfig) -> Result<Self> {
        let detector = GoertzelDetector::for_config(&config);
        Self::with_detector(config, Box::new(detector))
    }

    pub fn with_detector(config: SynthConfig, detector: Box<dyn ToneDetector>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, detector })
    }

    /// Decode `buffer` into a Morse string.
    ///
    /// # Errors
    /// `MorseError::InvalidSampleRate` if the buffer reports a zero rate,
    /// `MorseError::SampleRateMismatch` if it was not recorded at the
    /// configured rate.
    pub fn decode(&mut self, buffer: &PcmBuffer) -> Result<String> {
        if buffer.sample_rate == 0 {
            return Err(MorseError::InvalidSampleRate(buffer.sample_rate));
        }
        if buffer.sample_rate != self.config.sample_rate {
            return Err(MorseError::SampleRateMismatch {
                expected: self.config.sample_rate,
                found: buffer.sample_rate,
            });
        }
        let frame_len = sample_count(buffer.sample_rate, FRAME_MS)?.max(1);

        self.detector.reset();
        let samples = buffer.to_f32();
        let mut runs: Vec<(ToneDecision, usize)> = Vec::new();
        for frame in samples.chunks(frame_len) {
            let decision = self.detector.classify(frame);
            if let Some((last, len)) = runs.last_mut() {
                if *last == decision {
                    *len += frame.len();
                    continue;
                }
            }
            runs.push((decision, frame.len()));
        }

        let out = self.symbols_from_runs(&runs, buffer.sample_rate);
        debug!(runs = runs.len(), decoded = %out, "buffer decoded");
        Ok(out)
    }

    fn symbols_from_runs(&self, runs: &[(ToneDecision, usize)], sample_rate: u32) -> String {
        let split_ms = (self.config.dot_ms + self.config.dash_ms) / 2.0;
        let mut out = String::new();
        let mut seen_tone = false;

        for &(decision, len) in runs {
            let ms = len as f64 * 1000.0 / sample_rate as f64;
            match decision {
                ToneDecision::Tone => {
                    out.push(if ms < split_ms { '.' } else { '-' });
                    seen_tone = true;
                }
                ToneDecision::Silence if seen_tone && self.config.word_gap_ms > 0.0 => {
                    let gap = ms - self.config.symbol_gap_ms;
                    let spaces = (gap / self.config.word_gap_ms).round().max(0.0) as usize;
                    out.extend(std::iter::repeat(' ').take(spaces));
                }
                ToneDecision::Silence => {}
            }
        }

        out
    }
}
