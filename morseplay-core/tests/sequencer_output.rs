use morseplay_core::buffering::pcm::PcmBuffer;
use morseplay_core::{
    MorseDecoder, MorseError, PlaybackSink, SegmentKind, Sequencer, SynthConfig, ToneGenerator,
    UnknownSymbolPolicy,
};

const RATE: u32 = 44_100;
const SHORT: usize = 8_820; // 200 ms
const LONG: usize = 26_460; // 600 ms

/// Keeps every buffer it is asked to play.
#[derive(Default)]
struct RecordingSink {
    played: Vec<PcmBuffer>,
}

impl PlaybackSink for RecordingSink {
    fn play(&mut self, buffer: &PcmBuffer) -> Result<(), MorseError> {
        self.played.push(buffer.clone());
        Ok(())
    }
}

/// Always fails the way an absent audio device does.
struct UnavailableSink;

impl PlaybackSink for UnavailableSink {
    fn play(&mut self, _buffer: &PcmBuffer) -> Result<(), MorseError> {
        Err(MorseError::PlaybackUnavailable("no output device found".into()))
    }
}

fn sequencer() -> Sequencer {
    Sequencer::new(SynthConfig::default()).expect("default config is valid")
}

fn tone(ms: f64) -> Vec<i16> {
    ToneGenerator::new(RATE)
        .unwrap()
        .generate(1_000.0, ms)
        .unwrap()
        .samples
}

fn silence(len: usize) -> Vec<i16> {
    vec![0; len]
}

fn concat(parts: &[Vec<i16>]) -> Vec<i16> {
    parts.iter().flatten().copied().collect()
}

#[test]
fn dot_is_tone_then_short_silence() {
    let out = sequencer().render(".").unwrap();
    assert_eq!(out.len(), SHORT + SHORT);
    assert_eq!(out.samples, concat(&[tone(200.0), silence(SHORT)]));
}

#[test]
fn dash_is_long_tone_then_short_silence() {
    let out = sequencer().render("-").unwrap();
    assert_eq!(out.len(), LONG + SHORT);
    assert_eq!(out.samples, concat(&[tone(600.0), silence(SHORT)]));
}

#[test]
fn dot_space_dash_keeps_segment_order() {
    let out = sequencer().render(". -").unwrap();
    let expected = concat(&[
        tone(200.0),
        silence(SHORT),
        silence(LONG),
        tone(600.0),
        silence(SHORT),
    ]);
    assert_eq!(out.len(), SHORT + SHORT + LONG + LONG + SHORT);
    assert_eq!(out.samples, expected);
}

#[test]
fn rendering_is_concatenation_of_parts() {
    let seq = sequencer();
    let whole = seq.render("..- .--").unwrap();
    let mut joined = seq.render("..-").unwrap();
    joined.append(&seq.render(" ").unwrap()).unwrap();
    joined.append(&seq.render(".--").unwrap()).unwrap();
    assert_eq!(whole, joined);
}

#[test]
fn render_matches_plan() {
    let seq = sequencer();
    let code = "-. -.";
    let plan = seq.plan(code).unwrap();
    let expected: Vec<i16> = plan
        .iter()
        .flat_map(|&k| seq.segment(k).pcm.samples.clone())
        .collect();
    assert_eq!(seq.render(code).unwrap().samples, expected);
    assert_eq!(plan.iter().filter(|k| k.is_tone()).count(), 4);
    assert_eq!(plan.last(), Some(&SegmentKind::SymbolGap));
}

#[test]
fn play_hands_rendered_buffer_to_sink() {
    let seq = sequencer();
    let mut sink = RecordingSink::default();
    seq.play("..- .", &mut sink).unwrap();

    assert_eq!(sink.played.len(), 1);
    let played = &sink.played[0];
    assert_eq!(played, &seq.render("..- .").unwrap());
    assert_eq!(played.sample_rate, RATE);
    assert_eq!(played.channels(), 1);
    assert_eq!(played.bits_per_sample(), 16);
}

#[test]
fn playback_failure_propagates() {
    let err = sequencer().play(".", &mut UnavailableSink).unwrap_err();
    assert!(matches!(err, MorseError::PlaybackUnavailable(_)));
}

#[test]
fn rejected_input_never_reaches_sink() {
    let mut sink = RecordingSink::default();
    let err = sequencer().play(".-?", &mut sink).unwrap_err();
    assert!(matches!(
        err,
        MorseError::UnrecognizedSymbol {
            symbol: '?',
            position: 2
        }
    ));
    assert!(sink.played.is_empty());
}

#[test]
fn lenient_policy_plays_recognised_symbols() {
    let seq = Sequencer::new(SynthConfig {
        unknown_symbols: UnknownSymbolPolicy::Skip,
        ..SynthConfig::default()
    })
    .unwrap();
    let mut sink = RecordingSink::default();
    seq.play("SOS ...", &mut sink).unwrap();
    assert_eq!(sink.played[0], seq.render(" ...").unwrap());
}

#[test]
fn alternate_timings_are_honoured() {
    let config = SynthConfig {
        sample_rate: 8_000,
        frequency_hz: 600.0,
        dot_ms: 50.0,
        dash_ms: 150.0,
        symbol_gap_ms: 50.0,
        word_gap_ms: 350.0,
        ..SynthConfig::default()
    };
    let out = Sequencer::new(config).unwrap().render(".- ").unwrap();
    // 400 + 400 + 1200 + 400 + 2800
    assert_eq!(out.len(), 5_200);
    assert_eq!(out.sample_rate, 8_000);
}

#[test]
fn tone_at_nyquist_is_refused_instead_of_rendering_silence() {
    let config = SynthConfig {
        sample_rate: 8_000,
        frequency_hz: 4_000.0,
        ..SynthConfig::default()
    };
    assert!(matches!(
        Sequencer::new(config),
        Err(MorseError::InvalidFrequency(f)) if f == 4_000.0
    ));
}

#[test]
fn huge_timing_is_refused_instead_of_allocating() {
    let config = SynthConfig {
        dash_ms: 1e15,
        ..SynthConfig::default()
    };
    assert!(matches!(
        Sequencer::new(config),
        Err(MorseError::InvalidDuration(d)) if d == 1e15
    ));
}

#[test]
fn rendered_code_decodes_back() {
    let seq = sequencer();
    let buffer = seq.render("--.. ..- .").unwrap();
    let mut decoder = MorseDecoder::new(SynthConfig::default()).unwrap();
    assert_eq!(decoder.decode(&buffer).unwrap(), "--.. ..- .");
}
