// MIDI export: Standard MIDI File output from scheduled event streams.
//
// Output is SMF format 1 (multi-track). Track 0 is a conductor track with
// the tempo and time signature; each `ExportTrack` follows with a track
// name, a program change, its note events, and end-of-track.
//
// Scheduled events are already delta-encoded (scheduler.rs), so this module
// only maps them onto midly's bounded integer types. The whole file is built
// in memory first; `write_midi` is the single blocking write and never runs
// for a stream that failed to encode.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{MusicError, Result};
use crate::scheduler::{EventKind, ScheduledEvent};
use crate::time::{TickResolution, TimeSignature};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Largest delta a variable-length quantity in an SMF can hold.
pub const MAX_DELTA: u64 = (1 << 28) - 1;

/// Largest microseconds-per-quarter value the tempo meta event can hold.
const MAX_TEMPO_MICROS: u32 = (1 << 24) - 1;

/// MIDI clocks per metronome click in the time-signature event.
const CLOCKS_PER_CLICK: u8 = 24;

/// Notated 32nd notes per MIDI quarter note.
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;

/// Header-level settings shared by every track of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    pub resolution: TickResolution,
    pub time_signature: TimeSignature,
    /// Only feeds the tempo meta event; tick math never sees it.
    pub tempo_bpm: u32,
}

impl ExportSettings {
    /// Microseconds per quarter note for the tempo meta event.
    pub fn tempo_micros(&self) -> Result<u32> {
        if self.tempo_bpm == 0 {
            return Err(MusicError::InvalidTempo(self.tempo_bpm));
        }
        let micros = 60_000_000 / self.tempo_bpm;
        if micros == 0 || micros > MAX_TEMPO_MICROS {
            return Err(MusicError::InvalidTempo(self.tempo_bpm));
        }
        Ok(micros)
    }
}

/// One instrument part of the exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTrack {
    pub name: String,
    /// MIDI channel 0-15.
    pub channel: u8,
    /// General MIDI program 0-127.
    pub program: u8,
    pub events: Vec<ScheduledEvent>,
}

/// Build the in-memory SMF. Track names borrow from `tracks`.
pub fn build_smf<'a>(settings: &ExportSettings, tracks: &'a [ExportTrack]) -> Result<Smf<'a>> {
    let tempo = settings.tempo_micros()?;
    let sig = settings.time_signature;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(settings.resolution.ticks_per_quarter())),
    ));

    // Track 0: conductor
    smf.tracks.push(vec![
        meta(MetaMessage::Tempo(u24::new(tempo))),
        meta(MetaMessage::TimeSignature(
            sig.numerator(),
            sig.denominator_log2(),
            CLOCKS_PER_CLICK,
            THIRTY_SECONDS_PER_QUARTER,
        )),
        meta(MetaMessage::EndOfTrack),
    ]);

    for part in tracks {
        smf.tracks.push(part_track(part)?);
    }

    Ok(smf)
}

/// Serialize a complete file to bytes.
pub fn encode_midi(settings: &ExportSettings, tracks: &[ExportTrack]) -> Result<Vec<u8>> {
    let smf = build_smf(settings, tracks)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Write encoded bytes to `path` in one call.
pub fn write_midi(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

fn meta(message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(message),
    }
}

fn part_track(part: &ExportTrack) -> Result<Track<'_>> {
    if part.channel > 15 {
        return Err(MusicError::InvalidTrack(format!(
            "{}: channel {} is not 0-15",
            part.name, part.channel
        )));
    }
    if part.program > 127 {
        return Err(MusicError::InvalidTrack(format!(
            "{}: program {} is not 0-127",
            part.name, part.program
        )));
    }
    let channel = u4::new(part.channel);
    let program = u7::new(part.program);

    let mut track: Track<'_> = Vec::with_capacity(part.events.len() + 3);
    track.push(meta(MetaMessage::TrackName(part.name.as_bytes())));
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange { program },
        },
    });

    for ev in &part.events {
        if ev.delta_ticks > MAX_DELTA {
            return Err(MusicError::TickOverflow(ev.delta_ticks));
        }
        let key = u7::new(ev.note.pitch());
        let vel = u7::new(ev.velocity.min(127));
        let message = match ev.kind {
            EventKind::NoteOn => MidiMessage::NoteOn { key, vel },
            EventKind::NoteOff => MidiMessage::NoteOff { key, vel },
        };
        track.push(TrackEvent {
            delta: u28::new(ev.delta_ticks as u32),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track.push(meta(MetaMessage::EndOfTrack));
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chords::ChordEvent;
    use crate::scheduler::schedule;
    use crate::theory::Note;

    fn settings() -> ExportSettings {
        ExportSettings {
            resolution: TickResolution::STANDARD,
            time_signature: TimeSignature::COMMON,
            tempo_bpm: 85,
        }
    }

    fn chord_track() -> ExportTrack {
        let chords = vec![
            ChordEvent::new(0.0, 1.0, vec![Note::new(60).unwrap(), Note::new(64).unwrap()]),
            ChordEvent::new(1.0, 1.0, vec![Note::new(62).unwrap(), Note::new(65).unwrap()]),
        ];
        ExportTrack {
            name: "Chords".to_string(),
            channel: 0,
            program: 4,
            events: schedule(&chords, TimeSignature::COMMON, TickResolution::STANDARD).unwrap(),
        }
    }

    #[test]
    fn test_build_smf_layout() {
        let tracks = vec![chord_track()];
        let smf = build_smf(&settings(), &tracks).unwrap();
        // Conductor + one part.
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        // Name + program + 8 notes + end.
        assert_eq!(smf.tracks[1].len(), 11);
    }

    #[test]
    fn test_encoded_bytes_parse_back() {
        let tracks = vec![chord_track()];
        let bytes = encode_midi(&settings(), &tracks).unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);

        let conductor: Vec<_> = smf.tracks[0].iter().map(|e| e.kind).collect();
        assert_eq!(
            conductor[0],
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / 85)))
        );
        assert_eq!(
            conductor[1],
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))
        );

        let notes: Vec<(u32, bool, u8)> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some((e.delta.as_int(), true, key.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, .. },
                    ..
                } => Some((e.delta.as_int(), false, key.as_int())),
                _ => None,
            })
            .collect();
        assert_eq!(
            notes,
            vec![
                (0, true, 60),
                (0, true, 64),
                (1920, false, 60),
                (0, false, 64),
                (0, true, 62),
                (0, true, 65),
                (1920, false, 62),
                (0, false, 65),
            ]
        );
    }

    #[test]
    fn test_six_eight_time_signature_event() {
        let s = ExportSettings {
            time_signature: TimeSignature::new(6, 8).unwrap(),
            ..settings()
        };
        let smf = build_smf(&s, &[]).unwrap();
        assert_eq!(
            smf.tracks[0][1].kind,
            TrackEventKind::Meta(MetaMessage::TimeSignature(6, 3, 24, 8))
        );
    }

    #[test]
    fn test_invalid_tempo() {
        for bpm in [0, 1, 3] {
            let s = ExportSettings {
                tempo_bpm: bpm,
                ..settings()
            };
            assert!(matches!(build_smf(&s, &[]), Err(MusicError::InvalidTempo(b)) if b == bpm));
        }
        let s = ExportSettings {
            tempo_bpm: 4,
            ..settings()
        };
        assert_eq!(s.tempo_micros().unwrap(), 15_000_000);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut track = chord_track();
        track.channel = 16;
        assert!(matches!(
            build_smf(&settings(), std::slice::from_ref(&track)),
            Err(MusicError::InvalidTrack(_))
        ));
    }

    #[test]
    fn test_delta_overflow_rejected() {
        let mut track = chord_track();
        track.events[0].delta_ticks = MAX_DELTA + 1;
        assert!(matches!(
            encode_midi(&settings(), std::slice::from_ref(&track)),
            Err(MusicError::TickOverflow(d)) if d == MAX_DELTA + 1
        ));
    }
}
