// Music theory core: pitch classes, notes, scales and chord templates.
//
// Pure interval math. Nothing here knows about time or randomness; the
// generators (chords.rs, melody.rs) resolve templates through these
// functions and the scheduler (scheduler.rs) only ever sees `Note` values.
//
// Every resolved pitch goes through `Note::new`, which rejects anything
// outside the MIDI range 0-127. A root near the top of the keyboard plus a
// major seventh is an error, never a silently wrapped or clamped pitch.
//
// The scale and chord tables below are data, not derived: a wrong offset
// produces wrong-sounding music without any other symptom, so the tests
// pin them to literal pitch sets.

use crate::error::{MusicError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chromatic pitch-class names, sharps only. Index = semitones above C.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave used when a note name is given without one.
pub const DEFAULT_OCTAVE: i32 = 4;

/// A MIDI pitch number, guaranteed to be in 0-127.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note(u8);

impl Note {
    pub const MAX: u8 = 127;

    /// Middle C (C4).
    pub const MIDDLE_C: Note = Note(60);

    /// Checked constructor; out-of-range pitches are rejected, not clamped.
    pub fn new(pitch: i32) -> Result<Self> {
        if (0..=Self::MAX as i32).contains(&pitch) {
            Ok(Note(pitch as u8))
        } else {
            Err(MusicError::OutOfRangeNote(pitch))
        }
    }

    pub fn pitch(self) -> u8 {
        self.0
    }

    /// Pitch class 0-11 (0 = C).
    pub fn pitch_class(self) -> usize {
        (self.0 % 12) as usize
    }

    /// Scientific octave number (C4 = 60, so MIDI 0 is octave -1).
    pub fn octave(self) -> i32 {
        self.0 as i32 / 12 - 1
    }

    /// Transpose by a semitone offset, rejecting results outside 0-127.
    pub fn offset(self, semitones: i32) -> Result<Note> {
        Note::new(self.0 as i32 + semitones)
    }

    /// Absolute distance in semitones.
    pub fn distance(self, other: Note) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// Scientific pitch name, e.g. "C4" or "G#3".
    pub fn name(self) -> String {
        format!("{}{}", PITCH_CLASS_NAMES[self.pitch_class()], self.octave())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Note {
    type Err = MusicError;

    /// Accepts a raw MIDI number ("60") or a pitch name with optional
    /// octave ("C4", "g#3", "C-1", "A" = A4).
    fn from_str(input: &str) -> Result<Self> {
        let s = input.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let pitch: i32 = s
                .parse()
                .map_err(|_| MusicError::OutOfRangeNote(i32::MAX))?;
            return Note::new(pitch);
        }

        // The octave starts at the first digit or minus sign after the letter.
        let split = s
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c.is_ascii_digit() || c == '-')
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (name, octave) = s.split_at(split);
        let octave = if octave.is_empty() {
            DEFAULT_OCTAVE
        } else {
            octave
                .parse()
                .map_err(|_| MusicError::InvalidPitchClass(input.to_string()))?
        };
        note_name_to_pitch(name, octave)
    }
}

/// Index of a pitch-class name in `PITCH_CLASS_NAMES` (case-insensitive).
pub fn pitch_class_index(name: &str) -> Result<usize> {
    PITCH_CLASS_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .ok_or_else(|| MusicError::InvalidPitchClass(name.to_string()))
}

/// `12 * (octave + 1) + pitch_class`, so C4 = 60 and G#3 = 56.
///
/// Computed in i64 so any `i32` octave yields `OutOfRangeNote` rather than
/// overflowing.
pub fn note_name_to_pitch(name: &str, octave: i32) -> Result<Note> {
    let pc = pitch_class_index(name)? as i64;
    let pitch = 12 * (i64::from(octave) + 1) + pc;
    Note::new(pitch.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Add each scale offset to the root. Output is in offset order, which for
/// the built-in scales is strictly ascending.
pub fn scale_to_pitches(root: Note, offsets: &[u8]) -> Result<Vec<Note>> {
    offsets.iter().map(|&o| root.offset(o as i32)).collect()
}

/// Add each chord interval to the chord root, keeping voicing order.
pub fn chord_to_pitches(root: Note, intervals: &[u8]) -> Result<Vec<Note>> {
    intervals.iter().map(|&iv| root.offset(iv as i32)).collect()
}

/// The scales the melody generator can walk over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKey {
    MinorPentatonic,
    MajorPentatonic,
    NaturalMinor,
    NaturalMajor,
}

impl ScaleKey {
    pub const ALL: [ScaleKey; 4] = [
        ScaleKey::MinorPentatonic,
        ScaleKey::MajorPentatonic,
        ScaleKey::NaturalMinor,
        ScaleKey::NaturalMajor,
    ];

    /// Semitone offsets from the root; first is always 0, strictly ascending.
    pub fn offsets(self) -> &'static [u8] {
        match self {
            ScaleKey::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleKey::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleKey::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKey::NaturalMajor => &[0, 2, 4, 5, 7, 9, 11],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKey::MinorPentatonic => "minor_pentatonic",
            ScaleKey::MajorPentatonic => "major_pentatonic",
            ScaleKey::NaturalMinor => "natural_minor",
            ScaleKey::NaturalMajor => "natural_major",
        }
    }

    /// Resolve this scale against a root.
    pub fn pitches(self, root: Note) -> Result<Vec<Note>> {
        scale_to_pitches(root, self.offsets())
    }
}

impl fmt::Display for ScaleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleKey {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ScaleKey::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MusicError::InvalidScaleKey(s.to_string()))
    }
}

/// A diatonic seventh chord, relative to the key root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    /// Roman-numeral label, e.g. "ivm7".
    pub name: &'static str,
    /// Semitones from the key root to the chord root.
    pub degree: u8,
    /// Chord tones relative to the chord root, in voicing order.
    pub intervals: &'static [u8],
}

impl ChordTemplate {
    /// Resolve against a key root: `chord_to_pitches(root + degree, intervals)`.
    pub fn pitches(&self, key_root: Note) -> Result<Vec<Note>> {
        chord_to_pitches(key_root.offset(self.degree as i32)?, self.intervals)
    }
}

const MINOR_SEVENTH: &[u8] = &[0, 3, 7, 10];
const MAJOR_SEVENTH: &[u8] = &[0, 4, 7, 11];
const DOMINANT_SEVENTH: &[u8] = &[0, 4, 7, 10];
const HALF_DIMINISHED: &[u8] = &[0, 3, 6, 10];

static MINOR_TEMPLATES: [ChordTemplate; 7] = [
    ChordTemplate { name: "im7", degree: 0, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "iidim7", degree: 2, intervals: HALF_DIMINISHED },
    ChordTemplate { name: "IIImaj7", degree: 3, intervals: MAJOR_SEVENTH },
    ChordTemplate { name: "ivm7", degree: 5, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "vm7", degree: 7, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "VImaj7", degree: 8, intervals: MAJOR_SEVENTH },
    ChordTemplate { name: "VII7", degree: 10, intervals: DOMINANT_SEVENTH },
];

static MAJOR_TEMPLATES: [ChordTemplate; 7] = [
    ChordTemplate { name: "Imaj7", degree: 0, intervals: MAJOR_SEVENTH },
    ChordTemplate { name: "ii7", degree: 2, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "iii7", degree: 4, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "IVmaj7", degree: 5, intervals: MAJOR_SEVENTH },
    ChordTemplate { name: "V7", degree: 7, intervals: DOMINANT_SEVENTH },
    ChordTemplate { name: "vi7", degree: 9, intervals: MINOR_SEVENTH },
    ChordTemplate { name: "viidim7", degree: 11, intervals: HALF_DIMINISHED },
];

/// Key quality used by the chord generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Minor, Mode::Major];

    /// The seven diatonic seventh chords of this mode, one per scale degree.
    pub fn chord_templates(self) -> &'static [ChordTemplate] {
        match self {
            Mode::Minor => &MINOR_TEMPLATES,
            Mode::Major => &MAJOR_TEMPLATES,
        }
    }

    /// The seven-note scale the chord degrees are drawn from.
    pub fn diatonic_scale(self) -> ScaleKey {
        match self {
            Mode::Minor => ScaleKey::NaturalMinor,
            Mode::Major => ScaleKey::NaturalMajor,
        }
    }

    /// Melody scale paired with this mode.
    pub fn pentatonic(self) -> ScaleKey {
        match self {
            Mode::Minor => ScaleKey::MinorPentatonic,
            Mode::Major => ScaleKey::MajorPentatonic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Minor => "minor",
            Mode::Major => "major",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Mode::Minor),
            "major" => Ok(Mode::Major),
            _ => Err(MusicError::InvalidMode(s.to_string())),
        }
    }
}
