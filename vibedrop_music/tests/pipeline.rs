// End-to-end tests for the render pipeline.
//
// Renders chord and melody files in memory from seeded sources, parses the
// bytes back with midly, and checks the timeline that comes out: one chord
// per bar on exact bar boundaries, melody notes inside the requested span,
// and identical bytes for identical seeds. The export test writes into a
// scratch directory under the system temp dir.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind, num::u15};
use vibedrop_music::chords::generate_progression;
use vibedrop_music::render::{
    CHORD_FILE_NAME, ChordRequest, MelodyRequest, export, render_chords, render_melody,
};
use vibedrop_music::scheduler::schedule;
use vibedrop_music::theory::{Mode, Note, ScaleKey};
use vibedrop_music::time::{TickResolution, TimeSignature};
use vibedrop_prng::SeededRng;

/// (absolute tick, is_note_on, key) for every note message of a track.
fn note_timeline(smf: &Smf, track: usize) -> Vec<(u64, bool, u8)> {
    let mut tick = 0u64;
    let mut out = Vec::new();
    for ev in &smf.tracks[track] {
        tick += ev.delta.as_int() as u64;
        if let TrackEventKind::Midi { message, .. } = ev.kind {
            match message {
                MidiMessage::NoteOn { key, .. } => out.push((tick, true, key.as_int())),
                MidiMessage::NoteOff { key, .. } => out.push((tick, false, key.as_int())),
                _ => {}
            }
        }
    }
    out
}

fn chord_request(bars: usize, time_signature: TimeSignature) -> ChordRequest {
    ChordRequest {
        root: Note::MIDDLE_C,
        mode: Mode::Minor,
        bars,
        time_signature,
        resolution: TickResolution::STANDARD,
        tempo_bpm: 85,
    }
}

#[test]
fn chord_file_has_one_chord_per_bar() {
    let bytes = render_chords(&chord_request(8, TimeSignature::COMMON), &mut SeededRng::new(21)).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
    assert_eq!(smf.tracks.len(), 2);

    let timeline = note_timeline(&smf, 1);
    // Seventh chords: 4 ons + 4 offs per bar.
    assert_eq!(timeline.len(), 8 * 8);
    for (bar, block) in timeline.chunks(8).enumerate() {
        let start = bar as u64 * 1920;
        for &(tick, is_on, _) in &block[..4] {
            assert!(is_on);
            assert_eq!(tick, start);
        }
        for &(tick, is_on, _) in &block[4..] {
            assert!(!is_on);
            assert_eq!(tick, start + 1920);
        }
    }
}

#[test]
fn chord_file_respects_time_signature() {
    let three_four = TimeSignature::new(3, 4).unwrap();
    let bytes = render_chords(&chord_request(4, three_four), &mut SeededRng::new(3)).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    let has_sig = smf.tracks[0]
        .iter()
        .any(|e| e.kind == TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8)));
    assert!(has_sig);

    let timeline = note_timeline(&smf, 1);
    let last_off = timeline.last().unwrap();
    assert_eq!(last_off.0, 4 * 1440);
}

#[test]
fn zero_bars_renders_empty_part() {
    let bytes = render_chords(&chord_request(0, TimeSignature::COMMON), &mut SeededRng::new(1)).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert!(note_timeline(&smf, 1).is_empty());
}

#[test]
fn melody_file_stays_inside_requested_span() {
    let request = MelodyRequest {
        root: Note::new(57).unwrap(),
        scale: ScaleKey::MajorPentatonic,
        bars: 4,
        resolution: TickResolution::STANDARD,
        tempo_bpm: 90,
    };
    let scale: Vec<u8> = ScaleKey::MajorPentatonic
        .pitches(request.root)
        .unwrap()
        .iter()
        .map(|n| n.pitch())
        .collect();

    for seed in 0..20 {
        let bytes = render_melody(&request, &mut SeededRng::new(seed)).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let timeline = note_timeline(&smf, 1);
        assert_eq!(timeline.len() % 2, 0);
        for pair in timeline.chunks(2) {
            let (on_tick, on, key) = pair[0];
            let (off_tick, off, off_key) = pair[1];
            assert!(on && !off);
            assert_eq!(key, off_key);
            assert!(scale.contains(&key));
            assert!(on_tick < 4 * 1920, "seed {seed}: note starts at {on_tick}");
            assert!(off_tick - on_tick == 240 || off_tick - on_tick == 480);
        }
    }
}

#[test]
fn same_seed_same_bytes() {
    let request = chord_request(4, TimeSignature::COMMON);
    let a = render_chords(&request, &mut SeededRng::new(99)).unwrap();
    let b = render_chords(&request, &mut SeededRng::new(99)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn scheduling_a_progression_twice_is_identical() {
    let chords =
        generate_progression(Note::MIDDLE_C, 12, Mode::Major, &mut SeededRng::new(5)).unwrap();
    let first = schedule(&chords, TimeSignature::COMMON, TickResolution::STANDARD).unwrap();
    let second = schedule(&chords, TimeSignature::COMMON, TickResolution::STANDARD).unwrap();
    assert_eq!(first, second);
}

#[test]
fn export_writes_file() {
    let dir = std::env::temp_dir().join(format!("vibedrop-export-{}", std::process::id()));
    let bytes = render_chords(&chord_request(2, TimeSignature::COMMON), &mut SeededRng::new(4)).unwrap();
    let path = export(&dir, CHORD_FILE_NAME, &bytes).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    std::fs::remove_dir_all(&dir).unwrap();
}
