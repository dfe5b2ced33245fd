// Chord progression generator.
//
// Builds a pool of the seven diatonic seventh chords for a root and mode
// (theory.rs tables), then picks one chord per bar, independently and
// uniformly. There is no transition model and no anti-repetition: the same
// chord may fill every bar. Each bar gets exactly one `ChordEvent` starting
// on that bar and lasting one bar; scheduler.rs turns these into ticks.

use crate::error::Result;
use crate::theory::{Mode, Note};
use log::debug;
use vibedrop_prng::RandomSource;

/// A chord placed on the bar timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordEvent {
    /// Start position in bars; may be fractional.
    pub start_bar: f64,
    /// Length in bars; must be positive to be schedulable.
    pub duration_bars: f64,
    /// Chord tones in voicing order.
    pub notes: Vec<Note>,
}

impl ChordEvent {
    pub fn new(start_bar: f64, duration_bars: f64, notes: Vec<Note>) -> Self {
        ChordEvent {
            start_bar,
            duration_bars,
            notes,
        }
    }
}

/// One entry of the chord pool: template label plus resolved tones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledChord {
    pub name: &'static str,
    pub notes: Vec<Note>,
}

/// Resolve every diatonic template of `mode` against `root`.
///
/// Fails with `OutOfRangeNote` if any chord tone leaves 0-127, so a root
/// too high for the upper chords is rejected before any bar is generated.
pub fn chord_pool(root: Note, mode: Mode) -> Result<Vec<PooledChord>> {
    mode.chord_templates()
        .iter()
        .map(|t| {
            Ok(PooledChord {
                name: t.name,
                notes: t.pitches(root)?,
            })
        })
        .collect()
}

/// Generate `bar_count` one-bar chords, each drawn uniformly from the pool.
///
/// The bar count is not bounded here; callers that export check it with
/// `TimeSignature::span_ticks` first.
pub fn generate_progression(
    root: Note,
    bar_count: usize,
    mode: Mode,
    rng: &mut impl RandomSource,
) -> Result<Vec<ChordEvent>> {
    let pool = chord_pool(root, mode)?;
    let mut events = Vec::new();

    for bar in 0..bar_count {
        let idx = rng.choose_index(pool.len());
        let chord = &pool[idx];
        debug!("bar {}: {} {:?}", bar, chord.name, chord.notes);
        events.push(ChordEvent::new(bar as f64, 1.0, chord.notes.clone()));
    }

    Ok(events)
}
