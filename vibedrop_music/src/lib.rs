// Vibe Drop music generator
//
// Procedurally generates short RnB/lo-fi sketches (a diatonic seventh-chord
// progression and a pentatonic melody) and renders each into a Standard
// MIDI File. The interesting part is the time model: abstract positions in
// bars and beats become an ordered, delta-encoded stream of note-on and
// note-off events with integral tick arithmetic.
//
// Architecture:
// - theory.rs: Pitch classes, checked `Note` values, scale and chord tables
// - time.rs: Time signatures, tick resolution, bar/beat -> tick conversion
// - chords.rs: One random diatonic seventh chord per bar
// - melody.rs: Stepwise-biased random walk with rests (fixed 4/4 feel)
// - scheduler.rs: Chords/notes -> delta-time note-on/note-off stream
// - midi.rs: SMF output via midly
// - config.rs: JSON-loadable generator settings
// - render.rs: In-memory generate -> schedule -> encode pipeline, then export
// - error.rs: `MusicError` taxonomy
//
// All randomness flows through `vibedrop_prng::RandomSource`, so output is
// deterministic given a seed.

pub mod chords;
pub mod config;
pub mod error;
pub mod melody;
pub mod midi;
pub mod render;
pub mod scheduler;
pub mod theory;
pub mod time;

pub use error::{MusicError, Result};
