// Musical time: time signatures, tick resolution, and bar/beat -> tick
// conversion.
//
// Ticks are the one canonical time unit. A `TickResolution` counts ticks per
// quarter note; a `TimeSignature` says how many beats a bar holds and which
// note value is the beat. All positions the generators produce in bars or
// beats are converted here and nowhere else.
//
// Conversion rules:
// - ticks per beat unit = 4 * ticks_per_quarter / denominator, in integer
//   arithmetic (truncating). With a resolution that is a multiple of 12 and
//   a power-of-two denominator up to 16 this division is exact.
// - ticks for a (possibly fractional) bar count = round(bars * numerator *
//   ticks_per_beat_unit). Rounding rather than truncating keeps positions
//   like 1/3 bar from landing one tick early because of f64 error.

use crate::error::{MusicError, Result};
use std::fmt;
use std::str::FromStr;

/// Longest piece, in ticks, the generators will lay out. Equal to the
/// largest delta a MIDI file can store.
pub const MAX_SPAN_TICKS: u64 = (1 << 28) - 1;

/// Beats per bar over beat unit, e.g. 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Both parts must be positive and the denominator a power of two.
    pub fn new(numerator: u8, denominator: u8) -> Result<Self> {
        if numerator == 0 {
            return Err(MusicError::InvalidTimeSignature(format!(
                "{numerator}/{denominator}: numerator must be positive"
            )));
        }
        if !denominator.is_power_of_two() {
            return Err(MusicError::InvalidTimeSignature(format!(
                "{numerator}/{denominator}: denominator must be a power of two"
            )));
        }
        Ok(TimeSignature {
            numerator,
            denominator,
        })
    }

    /// Beats per bar.
    pub fn numerator(self) -> u8 {
        self.numerator
    }

    /// Beat unit (4 = quarter, 8 = eighth).
    pub fn denominator(self) -> u8 {
        self.denominator
    }

    /// Denominator as a power of two, the form MIDI meta events store.
    pub fn denominator_log2(self) -> u8 {
        self.denominator.trailing_zeros() as u8
    }

    /// Ticks in one beat of this signature (truncating integer division).
    pub fn ticks_per_beat_unit(self, resolution: TickResolution) -> u32 {
        4 * resolution.ticks_per_quarter() as u32 / self.denominator as u32
    }

    /// Ticks in one whole bar.
    pub fn ticks_per_bar(self, resolution: TickResolution) -> u64 {
        self.numerator as u64 * self.ticks_per_beat_unit(resolution) as u64
    }

    /// Ticks in `bars` whole bars. Fails with `TooManyBars` when the span
    /// would exceed `MAX_SPAN_TICKS`.
    pub fn span_ticks(self, bars: usize, resolution: TickResolution) -> Result<u64> {
        (bars as u64)
            .checked_mul(self.ticks_per_bar(resolution))
            .filter(|&ticks| ticks <= MAX_SPAN_TICKS)
            .ok_or(MusicError::TooManyBars(bars))
    }

    /// Convert a beat count (may be fractional) to ticks, rounded to nearest.
    pub fn ticks_for_beats(self, beats: f64, resolution: TickResolution) -> i64 {
        (beats * self.ticks_per_beat_unit(resolution) as f64).round() as i64
    }

    /// Convert a bar count (may be fractional) to ticks, rounded to nearest.
    pub fn ticks_for_bars(self, bars: f64, resolution: TickResolution) -> i64 {
        self.ticks_for_beats(bars * self.numerator as f64, resolution)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = MusicError;

    /// Parses "N/D", e.g. "4/4" or "6/8".
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MusicError::InvalidTimeSignature(format!("'{s}' is not of the form N/D"));
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let num: u8 = num.trim().parse().map_err(|_| invalid())?;
        let den: u8 = den.trim().parse().map_err(|_| invalid())?;
        TimeSignature::new(num, den)
    }
}

/// Ticks per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickResolution(u16);

impl TickResolution {
    /// Divisible by 2, 3, 4, 5, 6, 8, 10, 12, 15, 16 and more, so straight,
    /// swung and triplet subdivisions all land on whole ticks.
    pub const STANDARD: TickResolution = TickResolution(480);

    /// Largest value the MIDI header's metrical timing field can hold.
    pub const MAX: u32 = 0x7FFF;

    /// Must be a positive multiple of 12 (halves, thirds and quarters of a
    /// beat are then integral) and fit the MIDI header.
    pub fn new(ticks_per_quarter: u32) -> Result<Self> {
        if ticks_per_quarter == 0 || ticks_per_quarter % 12 != 0 || ticks_per_quarter > Self::MAX {
            return Err(MusicError::InvalidTickResolution(ticks_per_quarter));
        }
        Ok(TickResolution(ticks_per_quarter as u16))
    }

    pub fn ticks_per_quarter(self) -> u16 {
        self.0
    }

    /// Ticks in `1 / parts` of a quarter note.
    ///
    /// # Panics
    ///
    /// Panics if `parts` is zero.
    pub fn subdivision(self, parts: u16) -> u32 {
        (self.0 / parts) as u32
    }
}

impl Default for TickResolution {
    fn default() -> Self {
        TickResolution::STANDARD
    }
}
