//! `Sequencer` — turns a Morse string into one concatenated PCM buffer.
//!
//! ## Timing
//!
//! ```text
//! '.'  → [dot tone ][symbol gap]
//! '-'  → [dash tone][symbol gap]
//! ' '  → [word gap]
//! ```
//!
//! The four segments are rendered once in `Sequencer::new` and appended by
//! copy for every symbol, so rendering a string never re-runs the oscillator.

use tracing::{debug, info, warn};

use crate::{
    buffering::pcm::PcmBuffer,
    config::{SynthConfig, UnknownSymbolPolicy},
    error::{MorseError, Result},
    playback::PlaybackSink,
    tone::ToneGenerator,
};

/// One recognised input character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorseSymbol {
    Dot,
    Dash,
    /// A space: separates words.
    WordGap,
}

impl MorseSymbol {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Self::Dot),
            '-' => Some(Self::Dash),
            ' ' => Some(Self::WordGap),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Dot => '.',
            Self::Dash => '-',
            Self::WordGap => ' ',
        }
    }

    /// Segments emitted for this symbol, in order.
    pub fn segments(self) -> &'static [SegmentKind] {
        match self {
            Self::Dot => &[SegmentKind::Dot, SegmentKind::SymbolGap],
            Self::Dash => &[SegmentKind::Dash, SegmentKind::SymbolGap],
            Self::WordGap => &[SegmentKind::WordGap],
        }
    }
}

/// Label of a precomputed audio segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Dot,
    Dash,
    SymbolGap,
    WordGap,
}

impl SegmentKind {
    pub fn is_tone(self) -> bool {
        matches!(self, Self::Dot | Self::Dash)
    }
}

/// A labeled tone or silence buffer.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub kind: SegmentKind,
    pub pcm: PcmBuffer,
}

/// Parse `code` into symbols, applying `policy` to unrecognized characters.
///
/// # Errors
/// `MorseError::UnrecognizedSymbol` under `UnknownSymbolPolicy::Reject`.
/// `position` is the character index, not the byte offset.
pub fn parse_symbols(code: &str, policy: UnknownSymbolPolicy) -> Result<Vec<MorseSymbol>> {
    let mut symbols = Vec::with_capacity(code.len());
    for (position, c) in code.chars().enumerate() {
        match MorseSymbol::from_char(c) {
            Some(symbol) => symbols.push(symbol),
            None => match policy {
                UnknownSymbolPolicy::Skip => {
                    warn!(symbol = ?c, position, "skipping unrecognized morse symbol");
                }
                UnknownSymbolPolicy::Reject => {
                    return Err(MorseError::UnrecognizedSymbol {
                        symbol: c,
                        position,
                    });
                }
            },
        }
    }
    Ok(symbols)
}

/// Assembles Morse strings into PCM buffers.
#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SynthConfig,
    dot: AudioSegment,
    dash: AudioSegment,
    symbol_gap: AudioSegment,
    word_gap: AudioSegment,
}

impl Sequencer {
    /// Validate `config` and precompute the four segments.
    ///
    /// # Errors
    /// Any validation error from `SynthConfig::validate`.
    pub fn new(config: SynthConfig) -> Result<Self> {
        config.validate()?;

        let generator = ToneGenerator::new(config.sample_rate)?;
        let dot = AudioSegment {
            kind: SegmentKind::Dot,
            pcm: generator.generate(config.frequency_hz, config.dot_ms)?,
        };
        let dash = AudioSegment {
            kind: SegmentKind::Dash,
            pcm: generator.generate(config.frequency_hz, config.dash_ms)?,
        };
        let symbol_gap = AudioSegment {
            kind: SegmentKind::SymbolGap,
            pcm: PcmBuffer::silent(config.symbol_gap_ms, config.sample_rate)?,
        };
        let word_gap = AudioSegment {
            kind: SegmentKind::WordGap,
            pcm: PcmBuffer::silent(config.word_gap_ms, config.sample_rate)?,
        };

        debug!(
            sample_rate = config.sample_rate,
            frequency_hz = config.frequency_hz,
            dot = dot.pcm.len(),
            dash = dash.pcm.len(),
            symbol_gap = symbol_gap.pcm.len(),
            word_gap = word_gap.pcm.len(),
            "sequencer segments rendered"
        );

        Ok(Self {
            config,
            dot,
            dash,
            symbol_gap,
            word_gap,
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// The precomputed segment for `kind`.
    pub fn segment(&self, kind: SegmentKind) -> &AudioSegment {
        match kind {
            SegmentKind::Dot => &self.dot,
            SegmentKind::Dash => &self.dash,
            SegmentKind::SymbolGap => &self.symbol_gap,
            SegmentKind::WordGap => &self.word_gap,
        }
    }

    /// Ordered segment labels for `code`.
    pub fn plan(&self, code: &str) -> Result<Vec<SegmentKind>> {
        let symbols = parse_symbols(code, self.config.unknown_symbols)?;
        Ok(symbols
            .into_iter()
            .flat_map(|s| s.segments().iter().copied())
            .collect())
    }

    /// Render `code` into one concatenated buffer.
    pub fn render(&self, code: &str) -> Result<PcmBuffer> {
        let plan = self.plan(code)?;
        let total = plan.iter().map(|&k| self.segment(k).pcm.len()).sum();

        let mut out = PcmBuffer::new(Vec::with_capacity(total), self.config.sample_rate);
        for kind in &plan {
            out.append(&self.segment(*kind).pcm)?;
        }

        debug!(
            segments = plan.len(),
            samples = out.len(),
            duration_secs = out.duration_secs(),
            "morse string rendered"
        );
        Ok(out)
    }

    /// Render `code` and hand the buffer to `sink`, blocking until playback ends.
    pub fn play(&self, code: &str, sink: &mut dyn PlaybackSink) -> Result<()> {
        let buffer = self.render(code)?;
        info!(
            duration_secs = buffer.duration_secs(),
            "playing morse sequence"
        );
        sink.play(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> Sequencer {
        Sequencer::new(SynthConfig::default()).unwrap()
    }

    #[test]
    fn symbols_map_to_segments() {
        use SegmentKind::*;
        let plan = sequencer().plan(".- ").unwrap();
        assert_eq!(plan, vec![Dot, SymbolGap, Dash, SymbolGap, WordGap]);
    }

    #[test]
    fn precomputed_segment_lengths() {
        let seq = sequencer();
        assert_eq!(seq.segment(SegmentKind::Dot).pcm.len(), 8_820);
        assert_eq!(seq.segment(SegmentKind::Dash).pcm.len(), 26_460);
        assert_eq!(seq.segment(SegmentKind::SymbolGap).pcm.len(), 8_820);
        assert_eq!(seq.segment(SegmentKind::WordGap).pcm.len(), 26_460);
        assert!(seq.segment(SegmentKind::Dash).kind.is_tone());
        assert!(!seq.segment(SegmentKind::WordGap).kind.is_tone());
    }

    #[test]
    fn empty_input_renders_empty_buffer() {
        let buf = sequencer().render("").unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.sample_rate, 44_100);
    }

    #[test]
    fn unknown_symbol_rejected_by_default() {
        let err = sequencer().render(".x-").unwrap_err();
        assert!(matches!(
            err,
            MorseError::UnrecognizedSymbol {
                symbol: 'x',
                position: 1
            }
        ));
    }

    #[test]
    fn unknown_symbol_position_counts_chars() {
        let err = parse_symbols("é.?", UnknownSymbolPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            MorseError::UnrecognizedSymbol {
                symbol: 'é',
                position: 0
            }
        ));
    }

    #[test]
    fn unknown_symbol_skipped_when_lenient() {
        let lenient = Sequencer::new(SynthConfig {
            unknown_symbols: UnknownSymbolPolicy::Skip,
            ..SynthConfig::default()
        })
        .unwrap();
        let strict = sequencer();
        assert_eq!(
            lenient.render(".x/-").unwrap(),
            strict.render(".-").unwrap()
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Sequencer::new(SynthConfig {
            frequency_hz: -1.0,
            ..SynthConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, MorseError::InvalidFrequency(_)));
    }

    #[test]
    fn symbol_char_round_trip() {
        for c in ['.', '-', ' '] {
            assert_eq!(MorseSymbol::from_char(c).map(MorseSymbol::as_char), Some(c));
        }
        assert_eq!(MorseSymbol::from_char('_'), None);
    }
}
