// Melody generator: a stepwise-biased random walk over a scale.
//
// The walk starts on a random scale tone and advances a tick cursor until it
// reaches the end of the requested bars. Each step is either a rest (1 in 5)
// or a note. Durations come from a fixed pool of two eighths and one quarter,
// so eighths are drawn twice as often as quarters. A note prefers scale tones
// within a fourth (5 semitones) of the previous note.
//
// The melody always assumes four quarter-note beats per bar, whatever time
// signature the chord track uses. The last note may run past the final bar;
// it is not truncated.
//
// Every step advances the cursor by at least an eighth, so the walk always
// terminates, after at most `total_ticks / eighth` steps. The span itself is
// bounded by `MAX_SPAN_TICKS`; longer requests fail with `TooManyBars`.

use crate::error::Result;
use crate::theory::{Note, ScaleKey};
use crate::time::{TickResolution, TimeSignature};
use log::debug;
use vibedrop_prng::RandomSource;

/// Melody bars are always four quarter-note beats.
pub const MELODY_METER: TimeSignature = TimeSignature::COMMON;

/// A step is a rest with probability 1 / REST_ODDS.
pub const REST_ODDS: usize = 5;

/// Largest leap, in semitones, the walk prefers.
pub const MAX_STEP: u8 = 5;

/// One sounding melody note on the absolute tick timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyNoteEvent {
    pub onset_tick: u64,
    pub duration_ticks: u32,
    pub note: Note,
}

impl MelodyNoteEvent {
    pub fn end_tick(&self) -> u64 {
        self.onset_tick + self.duration_ticks as u64
    }
}

/// Result of one melody walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Melody {
    pub events: Vec<MelodyNoteEvent>,
    /// Length of the requested bars in ticks.
    pub total_ticks: u64,
    /// Where the walk's cursor stopped, counting trailing rests.
    pub end_tick: u64,
}

/// The duration pool: eighth, eighth, quarter.
pub fn duration_pool(resolution: TickResolution) -> [u32; 3] {
    let eighth = resolution.subdivision(2);
    [eighth, eighth, resolution.ticks_per_quarter() as u32]
}

/// Walk `scale_key` from `root` for `bar_count` bars of 4/4.
pub fn generate_melody(
    root: Note,
    scale_key: ScaleKey,
    bar_count: usize,
    resolution: TickResolution,
    rng: &mut impl RandomSource,
) -> Result<Melody> {
    let scale = scale_key.pitches(root)?;
    let durations = duration_pool(resolution);
    let total_ticks = MELODY_METER.span_ticks(bar_count, resolution)?;

    let mut events = Vec::new();
    let mut current: u64 = 0;
    let mut last_note = scale[rng.choose_index(scale.len())];

    while current < total_ticks {
        if rng.one_in(REST_ODDS) {
            let rest = durations[rng.choose_index(durations.len())];
            current += rest as u64;
            continue;
        }

        let duration = durations[rng.choose_index(durations.len())];

        let steps: Vec<Note> = scale
            .iter()
            .copied()
            .filter(|n| n.distance(last_note) <= MAX_STEP)
            .collect();
        let candidates = if steps.is_empty() { &scale } else { &steps };
        let note = candidates[rng.choose_index(candidates.len())];

        events.push(MelodyNoteEvent {
            onset_tick: current,
            duration_ticks: duration,
            note,
        });
        last_note = note;
        current += duration as u64;
    }

    debug!(
        "melody: {} notes over {} ticks (cursor ended at {})",
        events.len(),
        total_ticks,
        current
    );

    Ok(Melody {
        events,
        total_ticks,
        end_tick: current,
    })
}
