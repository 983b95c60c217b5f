//! Single-bin Goertzel filter tuned to the keyed tone frequency.
//!
//! Runs the second-order recurrence `w[n] = x[n] + k·w[n-1] − w[n-2]` with
//! `k = 2·cos(2π·f/fs)` over one frame, then reads the bin power from the last
//! two states without a complex multiply:
//!
//! ```text
//! |X(f)|² = w1² + w2² − k·w1·w2
//! amplitude ≈ 2·|X(f)| / N
//! ```
//!
//! A full-scale sine at `f` reports ≈ 1.0; energy at other frequencies is
//! rejected, so a tone keyed at the wrong pitch reads as silence.

use std::f64::consts::TAU;

use super::{ToneDecision, ToneDetector};
use crate::config::SynthConfig;

/// Amplitude (relative to full scale) at which a frame counts as tone.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

pub struct GoertzelDetector {
    w_n: f64,
    w_n_z1: f64,
    k_fb: f64,
    n: usize,
    threshold: f32,
}

impl GoertzelDetector {
    pub fn new(frequency_hz: f64, sample_rate: u32, threshold: f32) -> Self {
        let omega = TAU * frequency_hz / sample_rate.max(1) as f64;
        Self {
            w_n: 0.0,
            w_n_z1: 0.0,
            k_fb: omega.cos() * 2.0,
            n: 0,
            threshold,
        }
    }

    /// Detector for the tone `config` renders, at the default threshold.
    pub fn for_config(config: &SynthConfig) -> Self {
        Self::new(config.frequency_hz, config.sample_rate, DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn iterate(&mut self, x_n: f32) {
        let w_n_z2 = self.w_n_z1;
        self.w_n_z1 = self.w_n;
        self.w_n = x_n as f64 + self.w_n_z1 * self.k_fb - w_n_z2;
        self.n += 1;
    }

    /// Amplitude of the tuned bin over the samples fed since the last poll,
    /// then clear the filter state.
    pub fn poll(&mut self) -> f32 {
        let power =
            self.w_n * self.w_n + self.w_n_z1 * self.w_n_z1 - self.k_fb * self.w_n * self.w_n_z1;
        let amplitude = if self.n == 0 {
            0.0
        } else {
            2.0 * power.max(0.0).sqrt() / self.n as f64
        };
        self.reset();
        amplitude as f32
    }

    /// Amplitude of the tuned bin across `frame`.
    pub fn amplitude(&mut self, frame: &[f32]) -> f32 {
        self.reset();
        for &x in frame {
            self.iterate(x);
        }
        self.poll()
    }
}

impl ToneDetector for GoertzelDetector {
    fn classify(&mut self, frame: &[f32]) -> ToneDecision {
        if self.amplitude(frame) >= self.threshold {
            ToneDecision::Tone
        } else {
            ToneDecision::Silence
        }
    }

    fn reset(&mut self) {
        self.w_n = 0.0;
        self.w_n_z1 = 0.0;
        self.n = 0;
    }
}
