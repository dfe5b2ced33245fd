// Error taxonomy for generation, scheduling and export.
//
// Validation errors (pitch names, modes, scale keys, time signatures,
// resolutions) are raised before any generation work starts. Scheduler
// invariant violations are raised while building the event stream, which
// still happens entirely in memory, so no error path ever leaves a partial
// file behind.

/// Errors produced by the music pipeline.
#[derive(Debug, thiserror::Error)]
pub enum MusicError {
    #[error("invalid pitch class '{0}' (expected one of C C# D D# E F F# G G# A A# B)")]
    InvalidPitchClass(String),

    #[error("invalid mode '{0}' (expected 'minor' or 'major')")]
    InvalidMode(String),

    #[error(
        "invalid scale key '{0}' (expected minor_pentatonic, major_pentatonic, natural_minor or natural_major)"
    )]
    InvalidScaleKey(String),

    #[error("note {0} is outside the MIDI range 0-127")]
    OutOfRangeNote(i32),

    #[error("invalid time signature: {0}")]
    InvalidTimeSignature(String),

    #[error("invalid tick resolution {0} (must be a positive multiple of 12, at most 32767)")]
    InvalidTickResolution(u32),

    #[error("invalid tempo {0} bpm")]
    InvalidTempo(u32),

    #[error("chord {index} starts at invalid bar position {start_bar}")]
    InvalidPosition { index: usize, start_bar: f64 },

    #[error("event {index} has non-positive duration ({ticks} ticks)")]
    NegativeOrZeroDuration { index: usize, ticks: i64 },

    #[error("event {index} starts at tick {onset}, before the previous event ends at tick {previous_end}")]
    NegativeDelta {
        index: usize,
        onset: u64,
        previous_end: u64,
    },

    #[error("chord {0} has no tones")]
    EmptyChord(usize),

    #[error("invalid track: {0}")]
    InvalidTrack(String),

    #[error("{0} bars is longer than a MIDI file can hold")]
    TooManyBars(usize),

    #[error("delta of {0} ticks exceeds the MIDI file limit")]
    TickOverflow(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MusicError>;
