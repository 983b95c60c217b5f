//! Tone detection and Morse decoding.
//!
//! `MorseDecoder` asks a `ToneDetector` about each frame. The default is a
//! `GoertzelDetector` tuned to the configured tone frequency; callers can
//! swap in their own through `MorseDecoder::with_detector`.

pub mod decoder;
pub mod goertzel;

pub use goertzel::GoertzelDetector;

/// Whether a given audio frame carries the keyed tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneDecision {
    Tone,
    Silence,
}

/// A per-frame tone/silence classifier.
///
/// Implementors may be stateful (filter state, hangover counters).
pub trait ToneDetector: Send {
    /// Analyse one frame of normalised samples and return a tone/silence decision.
    fn classify(&mut self, frame: &[f32]) -> ToneDecision;

    /// Reset any internal state.
    fn reset(&mut self);
}
