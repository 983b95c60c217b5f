//! `morseplay` — render a Morse string and play it on the system output, or
//! listen on the microphone and decode what is keyed.

mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use morseplay_core::{
    audio::device::{list_input_devices, list_output_devices, DeviceInfo},
    CpalCapture, CpalPlayback, GoertzelDetector, MorseDecoder, NullPlayback, PlaybackSink,
    Sequencer, UnknownSymbolPolicy,
};
use tracing::{info, warn};

use crate::settings::{default_settings_path, load_settings, AppSettings};

/// Played when no code is given on the command line.
const DEMO_CODE: &str = "..- .";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Morse code to play: '.', '-' and space. Codes that look like flags
    /// (`--..`) are accepted as-is; `--` also ends option parsing.
    #[arg(allow_hyphen_values = true, value_name = "CODE")]
    code: Option<String>,

    /// Settings JSON (default: $MORSEPLAY_SETTINGS or the user data dir)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Preferred output device
    #[arg(long, value_name = "NAME")]
    device: Option<String>,

    /// Preferred input device for --listen
    #[arg(long, value_name = "NAME")]
    input_device: Option<String>,

    /// Skip characters other than '.', '-' and space
    #[arg(long)]
    lenient: bool,

    /// Render only, do not open an audio device
    #[arg(long)]
    dry_run: bool,

    /// Decode the rendered audio and compare it with CODE
    #[arg(long)]
    verify: bool,

    /// Print available output and input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Record from the microphone for SECS seconds and print the decoded code
    #[arg(long, value_name = "SECS", conflicts_with_all = ["code", "verify", "dry_run"])]
    listen: Option<f64>,

    /// Tone amplitude (0..1 of full scale) that counts as key-down when listening
    #[arg(long, value_name = "AMP")]
    threshold: Option<f32>,
}

fn print_devices(heading: &str, devices: Vec<DeviceInfo>) {
    println!("{heading}:");
    if devices.is_empty() {
        println!("  (none found)");
    }
    for d in devices {
        println!("  {}{}", d.name, if d.is_default { " (default)" } else { "" });
    }
}

/// Load settings and fold command-line overrides into them.
fn resolve_settings(cli: &Cli) -> AppSettings {
    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let mut app_settings = load_settings(&settings_path);
    if cli.lenient {
        app_settings.unknown_symbols = UnknownSymbolPolicy::Skip;
    }
    if cli.device.is_some() {
        app_settings.output_device = cli.device.clone();
    }
    if cli.input_device.is_some() {
        app_settings.input_device = cli.input_device.clone();
    }
    if let Some(threshold) = cli.threshold {
        app_settings.tone_threshold = threshold;
    }
    app_settings.normalize();
    info!(
        settings_path = ?settings_path,
        sample_rate = app_settings.sample_rate,
        frequency_hz = app_settings.frequency_hz,
        dot_ms = app_settings.dot_ms,
        dash_ms = app_settings.dash_ms,
        unknown_symbols = ?app_settings.unknown_symbols,
        "settings loaded"
    );
    app_settings
}

/// What `--verify` expects to decode from the rendered `code`.
///
/// Characters the sequencer skipped render nothing, and silence before the
/// first tone decodes to nothing.
fn expected_decode(code: &str) -> String {
    let keyed: String = code
        .chars()
        .filter(|&c| matches!(c, '.' | '-' | ' '))
        .collect();
    keyed.trim_start().to_string()
}

fn listen(secs: f64, app_settings: &AppSettings) -> anyhow::Result<()> {
    let config = app_settings.synth_config();
    let detector =
        GoertzelDetector::for_config(&config).with_threshold(app_settings.tone_threshold);
    let mut decoder = MorseDecoder::with_detector(config.clone(), Box::new(detector))
        .context("invalid decoder settings")?;

    let capture = CpalCapture::with_device(app_settings.input_device.clone());
    let buffer = capture
        .record(secs, config.sample_rate)
        .context("recording failed")?;

    let decoded = decoder.decode(&buffer)?;
    info!(decoded = %decoded, "recording decoded");
    println!("{}", decoded.trim_end());
    Ok(())
}

fn play(cli: Cli, app_settings: &AppSettings) -> anyhow::Result<()> {
    let config = app_settings.synth_config();
    let sequencer = Sequencer::new(config.clone()).context("invalid synthesis settings")?;

    let code = cli.code.unwrap_or_else(|| {
        info!("no code given, playing demo '{DEMO_CODE}'");
        DEMO_CODE.to_string()
    });

    let buffer = sequencer
        .render(&code)
        .with_context(|| format!("cannot render {code:?}"))?;
    info!(
        samples = buffer.len(),
        duration_secs = buffer.duration_secs(),
        "morse sequence rendered"
    );

    if cli.verify {
        let decoded = MorseDecoder::new(config)?.decode(&buffer)?;
        let expected = expected_decode(&code);
        if decoded != expected {
            bail!("verification failed: rendered {expected:?}, decoded {decoded:?}");
        }
        info!(decoded = %decoded, "verification passed");
    }

    let mut sink: Box<dyn PlaybackSink> = if cli.dry_run {
        Box::new(NullPlayback)
    } else {
        Box::new(CpalPlayback::with_device(app_settings.output_device.clone()))
    };
    sink.play(&buffer).context("playback failed")?;

    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_devices {
        print_devices("output devices", list_output_devices());
        print_devices("input devices", list_input_devices());
        return Ok(());
    }

    let app_settings = resolve_settings(&cli);
    match cli.listen {
        Some(secs) => listen(secs, &app_settings),
        None => play(cli, &app_settings),
    }
}

fn main() {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("morseplay=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        warn!("morseplay failed: {e:#}");
        eprintln!("morseplay: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("morseplay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn codes_starting_with_dashes_are_positional() {
        for code in ["--..", "---", "-.-.", "-", "-- --.."] {
            let cli = parse(&["--dry-run", code]);
            assert_eq!(cli.code.as_deref(), Some(code), "{code:?}");
            assert!(cli.dry_run);
        }
    }

    #[test]
    fn double_dash_separator_ends_options() {
        let cli = parse(&["--", "--.."]);
        assert_eq!(cli.code.as_deref(), Some("--.."));

        // A bare `--` is the separator, so the letter M needs one in front.
        let cli = parse(&["--", "--"]);
        assert_eq!(cli.code.as_deref(), Some("--"));

        let cli = parse(&["--verify", "--", "--dry-run"]);
        assert_eq!(cli.code.as_deref(), Some("--dry-run"));
        assert!(cli.verify);
        assert!(!cli.dry_run);
    }

    #[test]
    fn quoted_code_with_spaces_is_one_argument() {
        let cli = parse(&["-- --.."]);
        assert_eq!(cli.code.as_deref(), Some("-- --.."));
    }

    #[test]
    fn flags_are_still_recognised_around_the_code() {
        let cli = parse(&["--lenient", "..- .", "--device", "Headphones"]);
        assert_eq!(cli.code.as_deref(), Some("..- ."));
        assert!(cli.lenient);
        assert_eq!(cli.device.as_deref(), Some("Headphones"));
        assert_eq!(cli.listen, None);
    }

    #[test]
    fn listen_takes_seconds_and_excludes_code() {
        let cli = parse(&[
            "--listen",
            "2.5",
            "--input-device",
            "USB Mic",
            "--threshold",
            "0.2",
        ]);
        assert_eq!(cli.listen, Some(2.5));
        assert_eq!(cli.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(cli.threshold, Some(0.2));
        assert!(cli.code.is_none());

        assert!(Cli::try_parse_from(["morseplay", "--listen", "2", "..."]).is_err());
    }

    #[test]
    fn second_code_argument_rejected() {
        assert!(Cli::try_parse_from(["morseplay", "...", "---"]).is_err());
    }

    #[test]
    fn verify_expectation_drops_skipped_and_leading_characters() {
        assert_eq!(expected_decode("  ..- ."), "..- .");
        assert_eq!(expected_decode("SOS ... "), "... ");
        assert_eq!(expected_decode("--.."), "--..");
    }
}
