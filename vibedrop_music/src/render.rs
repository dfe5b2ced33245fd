// Render pipeline: generation -> scheduling -> MIDI bytes.
//
// Each render runs fully in memory and returns the encoded file. Nothing is
// written until a render has succeeded, and `export` is the only function
// that touches the filesystem, so a failure anywhere upstream leaves no
// partial file behind.
//
// Chord files carry the requested time signature. Melody files are always
// written as 4/4, matching the melody generator's fixed bar length.

use crate::chords::generate_progression;
use crate::config::Settings;
use crate::error::Result;
use crate::melody::{MELODY_METER, generate_melody};
use crate::midi::{ExportSettings, ExportTrack, encode_midi, write_midi};
use crate::scheduler::{schedule, schedule_melody};
use crate::theory::{Mode, Note, ScaleKey};
use crate::time::{TickResolution, TimeSignature};
use log::info;
use std::path::{Path, PathBuf};
use vibedrop_prng::RandomSource;

/// General MIDI Electric Piano 1.
pub const CHORD_PROGRAM: u8 = 4;
/// General MIDI Acoustic Grand Piano.
pub const MELODY_PROGRAM: u8 = 0;
pub const CHORD_CHANNEL: u8 = 0;
pub const MELODY_CHANNEL: u8 = 1;

pub const CHORD_FILE_NAME: &str = "chords.mid";
pub const MELODY_FILE_NAME: &str = "melody.mid";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordRequest {
    pub root: Note,
    pub mode: Mode,
    pub bars: usize,
    pub time_signature: TimeSignature,
    pub resolution: TickResolution,
    pub tempo_bpm: u32,
}

impl ChordRequest {
    pub fn from_settings(settings: &Settings) -> Self {
        ChordRequest {
            root: settings.root,
            mode: settings.mode,
            bars: settings.bars,
            time_signature: settings.time_signature,
            resolution: settings.resolution,
            tempo_bpm: settings.bpm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodyRequest {
    pub root: Note,
    pub scale: ScaleKey,
    pub bars: usize,
    pub resolution: TickResolution,
    pub tempo_bpm: u32,
}

impl MelodyRequest {
    pub fn from_settings(settings: &Settings) -> Self {
        MelodyRequest {
            root: settings.root,
            scale: settings.scale,
            bars: settings.bars,
            resolution: settings.resolution,
            tempo_bpm: settings.bpm,
        }
    }
}

/// Generate a chord progression and encode it as a MIDI file.
pub fn render_chords(request: &ChordRequest, rng: &mut impl RandomSource) -> Result<Vec<u8>> {
    let export = ExportSettings {
        resolution: request.resolution,
        time_signature: request.time_signature,
        tempo_bpm: request.tempo_bpm,
    };
    export.tempo_micros()?;
    request.time_signature.span_ticks(request.bars, request.resolution)?;

    let chords = generate_progression(request.root, request.bars, request.mode, rng)?;
    let events = schedule(&chords, request.time_signature, request.resolution)?;
    info!(
        "chords: {} bars of {} {} in {}, {} events",
        request.bars,
        request.root,
        request.mode,
        request.time_signature,
        events.len()
    );

    let track = ExportTrack {
        name: "Chords".to_string(),
        channel: CHORD_CHANNEL,
        program: CHORD_PROGRAM,
        events,
    };
    encode_midi(&export, std::slice::from_ref(&track))
}

/// Generate a melody and encode it as a MIDI file.
pub fn render_melody(request: &MelodyRequest, rng: &mut impl RandomSource) -> Result<Vec<u8>> {
    let export = ExportSettings {
        resolution: request.resolution,
        time_signature: MELODY_METER,
        tempo_bpm: request.tempo_bpm,
    };
    export.tempo_micros()?;

    let melody = generate_melody(request.root, request.scale, request.bars, request.resolution, rng)?;
    let events = schedule_melody(&melody.events)?;
    info!(
        "melody: {} bars of {} {}, {} notes",
        request.bars,
        request.root,
        request.scale,
        melody.events.len()
    );

    let track = ExportTrack {
        name: "Melody".to_string(),
        channel: MELODY_CHANNEL,
        program: MELODY_PROGRAM,
        events,
    };
    encode_midi(&export, std::slice::from_ref(&track))
}

/// Create `dir` if needed and write `bytes` to `dir/file_name`.
pub fn export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    write_midi(&path, bytes)?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
