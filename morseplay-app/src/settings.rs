//! Persistent application settings (JSON file in the user data directory).

use std::fs;
use std::path::{Path, PathBuf};

use morseplay_core::{detect::goertzel::DEFAULT_THRESHOLD, SynthConfig, UnknownSymbolPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    pub sample_rate: u32,
    pub frequency_hz: f64,
    pub dot_ms: f64,
    pub dash_ms: f64,
    pub symbol_gap_ms: f64,
    pub word_gap_ms: f64,
    pub unknown_symbols: UnknownSymbolPolicy,
    pub output_device: Option<String>,
    pub input_device: Option<String>,
    /// Goertzel amplitude above which a listened frame counts as tone.
    pub tone_threshold: f32,
}

/// Highest tone frequency kept by `normalize`, as a fraction of the sample rate.
const MAX_FREQUENCY_RATIO: f64 = 0.45;

impl Default for AppSettings {
    fn default() -> Self {
        let synth = SynthConfig::default();
        Self {
            sample_rate: synth.sample_rate,
            frequency_hz: synth.frequency_hz,
            dot_ms: synth.dot_ms,
            dash_ms: synth.dash_ms,
            symbol_gap_ms: synth.symbol_gap_ms,
            word_gap_ms: synth.word_gap_ms,
            unknown_symbols: synth.unknown_symbols,
            output_device: None,
            input_device: None,
            tone_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        self.sample_rate = self.sample_rate.clamp(8_000, 192_000);
        let max_frequency = (self.sample_rate as f64 * MAX_FREQUENCY_RATIO).min(4_000.0);
        self.frequency_hz = clamp_or(self.frequency_hz, 100.0, max_frequency, 1_000.0);
        self.dot_ms = clamp_or(self.dot_ms, 10.0, 2_000.0, 200.0);
        self.dash_ms = clamp_or(self.dash_ms, 10.0, 6_000.0, 600.0);
        self.symbol_gap_ms = clamp_or(self.symbol_gap_ms, 0.0, 2_000.0, 200.0);
        self.word_gap_ms = clamp_or(self.word_gap_ms, 0.0, 6_000.0, 600.0);
        self.output_device = trimmed_name(self.output_device.take());
        self.input_device = trimmed_name(self.input_device.take());
        self.tone_threshold = if self.tone_threshold.is_nan() {
            DEFAULT_THRESHOLD
        } else {
            self.tone_threshold.clamp(0.001, 1.0)
        };
    }

    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig {
            sample_rate: self.sample_rate,
            frequency_hz: self.frequency_hz,
            dot_ms: self.dot_ms,
            dash_ms: self.dash_ms,
            symbol_gap_ms: self.symbol_gap_ms,
            word_gap_ms: self.word_gap_ms,
            unknown_symbols: self.unknown_symbols,
        }
    }
}

fn trimmed_name(name: Option<String>) -> Option<String> {
    name.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Clamp `value` into `[min, max]`, replacing NaN with `fallback`.
fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

pub fn default_settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os("MORSEPLAY_SETTINGS") {
        return PathBuf::from(path);
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("morseplay")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("morseplay")
            .join("settings.json")
    }
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = ?path, "ignoring malformed settings file: {e}");
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    };
    settings.normalize();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_config() {
        assert_eq!(AppSettings::default().synth_config(), SynthConfig::default());
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut settings = AppSettings {
            sample_rate: 0,
            frequency_hz: -5.0,
            dot_ms: f64::NAN,
            word_gap_ms: 1e9,
            output_device: Some("   ".into()),
            ..AppSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.sample_rate, 8_000);
        assert_eq!(settings.frequency_hz, 100.0);
        assert_eq!(settings.dot_ms, 200.0);
        assert_eq!(settings.word_gap_ms, 6_000.0);
        assert_eq!(settings.output_device, None);
        assert!(settings.synth_config().validate().is_ok());
    }

    #[test]
    fn normalize_keeps_frequency_below_nyquist() {
        let mut settings: AppSettings =
            serde_json::from_str(r#"{"sampleRate": 8000, "frequencyHz": 4000}"#).unwrap();
        settings.normalize();
        assert_eq!(settings.sample_rate, 8_000);
        assert_eq!(settings.frequency_hz, 3_600.0);
        assert!(settings.synth_config().validate().is_ok());

        let mut settings = AppSettings {
            frequency_hz: 4_000.0,
            ..AppSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.frequency_hz, 4_000.0);
    }

    #[test]
    fn normalize_trims_input_device_and_threshold() {
        let mut settings: AppSettings = serde_json::from_str(
            r#"{"inputDevice": "  USB Mic ", "toneThreshold": 7.5}"#,
        )
        .unwrap();
        settings.normalize();
        assert_eq!(settings.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(settings.tone_threshold, 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"frequencyHz": 650, "outputDevice": "Headphones"}"#)
                .unwrap();
        assert_eq!(settings.frequency_hz, 650.0);
        assert_eq!(settings.output_device.as_deref(), Some("Headphones"));
        assert_eq!(settings.dash_ms, 600.0);
        assert_eq!(settings.unknown_symbols, UnknownSymbolPolicy::Reject);
        assert_eq!(settings.tone_threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("morseplay-settings-does-not-exist.json");
        let settings = load_settings(&path);
        assert_eq!(settings.synth_config(), SynthConfig::default());
    }
}
