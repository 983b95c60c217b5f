//! Playback abstraction.
//!
//! `PlaybackSink` is the seam between synthesis and the audio device: the
//! cpal backend (`audio::CpalPlayback`), `NullPlayback`, or any test double
//! can consume the rendered buffer without touching the sequencer.

use tracing::debug;

use crate::{buffering::pcm::PcmBuffer, error::Result};

/// Consumes a finished PCM buffer.
pub trait PlaybackSink {
    /// Play `buffer` and block until it has been fully rendered.
    ///
    /// # Errors
    /// Implementations report every device-side failure as
    /// `MorseError::PlaybackUnavailable`.
    fn play(&mut self, buffer: &PcmBuffer) -> Result<()>;
}

/// Sink that discards every buffer. Used for dry runs and no-audio builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl PlaybackSink for NullPlayback {
    fn play(&mut self, buffer: &PcmBuffer) -> Result<()> {
        debug!(
            samples = buffer.len(),
            sample_rate = buffer.sample_rate,
            "null playback: buffer discarded"
        );
        Ok(())
    }
}

impl<S: PlaybackSink + ?Sized> PlaybackSink for Box<S> {
    fn play(&mut self, buffer: &PcmBuffer) -> Result<()> {
        (**self).play(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_any_buffer() {
        let mut sink = NullPlayback;
        assert!(sink.play(&PcmBuffer::empty(44_100)).is_ok());
        assert!(sink.play(&PcmBuffer::new(vec![1; 64], 8_000)).is_ok());
    }

    #[test]
    fn boxed_sink_delegates() {
        let mut sink: Box<dyn PlaybackSink> = Box::new(NullPlayback);
        assert!(sink.play(&PcmBuffer::empty(44_100)).is_ok());
    }
}
