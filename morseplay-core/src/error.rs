use thiserror::Error;

/// All errors produced by morseplay-core.
#[derive(Debug, Error)]
pub enum MorseError {
    #[error("invalid tone frequency: {0} Hz")]
    InvalidFrequency(f64),

    #[error("invalid duration: {0} ms")]
    InvalidDuration(f64),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("unrecognized morse symbol {symbol:?} at position {position}")]
    UnrecognizedSymbol { symbol: char, position: usize },

    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("playback unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),
}

pub type Result<T> = std::result::Result<T, MorseError>;
