// Event scheduler: turns bar-positioned chords and tick-positioned melody
// notes into one ordered, delta-encoded stream of note-on/note-off events.
//
// Stream shape, per block (a chord, or a single melody note):
//
//   on(tone 1, delta = onset - last_end)  on(tone 2, 0)  ...  on(tone n, 0)
//   off(tone 1, delta = duration)         off(tone 2, 0) ...  off(tone n, 0)
//
// All tones of a chord start together, so only the first note-on carries a
// delta; likewise only the first note-off carries the duration. Blocks are
// emitted strictly one after another: every note-off of block k comes before
// any note-on of block k+1, even when the delta between them is zero.
// Consumers rely on that stream order to disambiguate simultaneous events.
//
// `last_end` starts at 0 and becomes `onset + duration` after each block.
// If a block starts before `last_end` (overlap, or two chords on the same
// bar) the delta would be negative. `OverlapPolicy::Clamp` emits it at
// zero and logs a warning; `OverlapPolicy::Reject` fails with
// `NegativeDelta`. `last_end` always follows the nominal onset, so a
// clamped block does not push later blocks back.
//
// Every block is validated before anything is emitted. Scheduling is a pure
// function of its input: the same chords always give the same stream.

use crate::chords::ChordEvent;
use crate::error::{MusicError, Result};
use crate::melody::MelodyNoteEvent;
use crate::theory::Note;
use crate::time::{TickResolution, TimeSignature};
use log::warn;

/// Note-on velocity for chord tones.
pub const CHORD_VELOCITY: u8 = 80;
/// Note-on velocity for melody notes.
pub const MELODY_VELOCITY: u8 = 90;
/// Velocity carried by every note-off.
pub const NOTE_OFF_VELOCITY: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

/// One entry of the delta-encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Ticks since the previous event in the stream.
    pub delta_ticks: u64,
    pub kind: EventKind,
    pub note: Note,
    pub velocity: u8,
}

/// What to do with a block that starts before the previous one ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Emit it with a zero delta.
    #[default]
    Clamp,
    /// Fail with `NegativeDelta`.
    Reject,
}

/// A validated group of simultaneous tones on the tick timeline.
struct Block<'a> {
    /// Position in the caller's input, for error reporting.
    index: usize,
    onset: u64,
    duration: u64,
    notes: &'a [Note],
    velocity: u8,
}

/// Schedule chords, clamping overlaps to a zero delta.
pub fn schedule(
    chords: &[ChordEvent],
    time_signature: TimeSignature,
    resolution: TickResolution,
) -> Result<Vec<ScheduledEvent>> {
    schedule_with_policy(chords, time_signature, resolution, OverlapPolicy::Clamp)
}

/// Schedule chords under an explicit overlap policy.
///
/// Chords are stably sorted by `start_bar` first; chords sharing a start
/// keep their input order.
pub fn schedule_with_policy(
    chords: &[ChordEvent],
    time_signature: TimeSignature,
    resolution: TickResolution,
    policy: OverlapPolicy,
) -> Result<Vec<ScheduledEvent>> {
    let mut order: Vec<(usize, &ChordEvent)> = chords.iter().enumerate().collect();
    order.sort_by(|a, b| a.1.start_bar.total_cmp(&b.1.start_bar));

    let blocks = order
        .into_iter()
        .map(|(index, chord)| chord_block(index, chord, time_signature, resolution))
        .collect::<Result<Vec<_>>>()?;

    encode(&blocks, policy)
}

/// Schedule melody notes from their absolute onsets.
///
/// Rests between notes become delta gaps on the following note-on.
pub fn schedule_melody(events: &[MelodyNoteEvent]) -> Result<Vec<ScheduledEvent>> {
    let mut order: Vec<(usize, &MelodyNoteEvent)> = events.iter().enumerate().collect();
    order.sort_by_key(|(_, ev)| ev.onset_tick);

    let blocks = order
        .into_iter()
        .map(|(index, ev)| {
            if ev.duration_ticks == 0 {
                return Err(MusicError::NegativeOrZeroDuration { index, ticks: 0 });
            }
            Ok(Block {
                index,
                onset: ev.onset_tick,
                duration: ev.duration_ticks as u64,
                notes: std::slice::from_ref(&ev.note),
                velocity: MELODY_VELOCITY,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    encode(&blocks, OverlapPolicy::Clamp)
}

/// Absolute tick of every event: the running sum of deltas.
pub fn absolute_ticks(events: &[ScheduledEvent]) -> Vec<u64> {
    events
        .iter()
        .scan(0u64, |tick, ev| {
            *tick += ev.delta_ticks;
            Some(*tick)
        })
        .collect()
}

fn chord_block(
    index: usize,
    chord: &ChordEvent,
    time_signature: TimeSignature,
    resolution: TickResolution,
) -> Result<Block<'_>> {
    if !chord.start_bar.is_finite() || chord.start_bar < 0.0 {
        return Err(MusicError::InvalidPosition {
            index,
            start_bar: chord.start_bar,
        });
    }
    if chord.notes.is_empty() {
        return Err(MusicError::EmptyChord(index));
    }

    let duration = if chord.duration_bars.is_finite() {
        time_signature.ticks_for_bars(chord.duration_bars, resolution)
    } else {
        0
    };
    if duration <= 0 {
        return Err(MusicError::NegativeOrZeroDuration {
            index,
            ticks: duration,
        });
    }

    Ok(Block {
        index,
        onset: time_signature.ticks_for_bars(chord.start_bar, resolution) as u64,
        duration: duration as u64,
        notes: &chord.notes,
        velocity: CHORD_VELOCITY,
    })
}

fn encode(blocks: &[Block<'_>], policy: OverlapPolicy) -> Result<Vec<ScheduledEvent>> {
    let mut out = Vec::with_capacity(blocks.iter().map(|b| b.notes.len() * 2).sum());
    let mut last_end: u64 = 0;

    for block in blocks {
        let delta = match block.onset.checked_sub(last_end) {
            Some(delta) => delta,
            None => match policy {
                OverlapPolicy::Clamp => {
                    warn!(
                        "event {} starts at tick {} but the previous one ends at {}; clamping delta to 0",
                        block.index, block.onset, last_end
                    );
                    0
                }
                OverlapPolicy::Reject => {
                    return Err(MusicError::NegativeDelta {
                        index: block.index,
                        onset: block.onset,
                        previous_end: last_end,
                    });
                }
            },
        };

        for (i, &note) in block.notes.iter().enumerate() {
            out.push(ScheduledEvent {
                delta_ticks: if i == 0 { delta } else { 0 },
                kind: EventKind::NoteOn,
                note,
                velocity: block.velocity,
            });
        }
        for (i, &note) in block.notes.iter().enumerate() {
            out.push(ScheduledEvent {
                delta_ticks: if i == 0 { block.duration } else { 0 },
                kind: EventKind::NoteOff,
                note,
                velocity: NOTE_OFF_VELOCITY,
            });
        }

        last_end = block.onset + block.duration;
    }

    Ok(out)
}
