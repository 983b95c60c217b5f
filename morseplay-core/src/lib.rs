//! # morseplay-core
//!
//! Morse-code tone synthesis SDK.
//!
//! ## Architecture
//!
//! ```text
//! "..- ."  → Sequencer::plan ─► [Dot, SymbolGap, Dot, SymbolGap, Dash, ...]
//!                  │
//!          precomputed AudioSegments (ToneGenerator / PcmBuffer::silent)
//!                  │
//!          Sequencer::render → PcmBuffer (mono, i16, 44.1 kHz)
//!                  │
//!          PlaybackSink::play (cpal, null, or caller-provided)
//!
//! CpalCapture::record → PcmBuffer → MorseDecoder (Goertzel @ frequency_hz) → "..- ."
//! ```
//!
//! Everything up to `render` is a pure, synchronous computation. Playback
//! blocks the caller until the device has consumed the whole buffer, and
//! recording blocks for the requested duration.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod config;
pub mod detect;
pub mod error;
pub mod playback;
pub mod sequencer;
pub mod tone;

// Convenience re-exports for downstream crates
pub use buffering::pcm::PcmBuffer;
pub use config::{SynthConfig, UnknownSymbolPolicy};
pub use detect::{decoder::MorseDecoder, GoertzelDetector, ToneDecision, ToneDetector};
pub use error::MorseError;
pub use playback::{NullPlayback, PlaybackSink};
pub use sequencer::{AudioSegment, MorseSymbol, SegmentKind, Sequencer};
pub use tone::ToneGenerator;

pub use audio::{CpalCapture, CpalPlayback};
