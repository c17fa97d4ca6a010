// keymatch-core/src/lib.rs

//! The core logic for the keymatch transposition assistant.
//! This crate is responsible for pitch detection, estimate aggregation,
//! and the semitone arithmetic that decides how far to transpose a song
//! to match a singer's voice. It is completely headless and contains
//! no UI code; the actual pitch-shifting transform is consumed by the
//! caller from an external component.

pub mod aggregate;
pub mod audio;
pub mod pitch;
pub mod session;
pub mod tuning;

use serde::{Deserialize, Serialize};

/// The outcome of comparing a song's pitch against a voice's pitch.
///
/// Bundles both aggregated pitches with the integer semitone shift the
/// caller should hand to a transposition transform. Serializable so the
/// CLI can persist it as a report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransposePlan {
    /// Representative pitch of the song material, in Hz.
    pub song_pitch: f32,
    /// Representative pitch of the target voice, in Hz.
    pub voice_pitch: f32,
    /// Equal-tempered semitones to transpose the song by (positive = up).
    pub semitone_shift: i32,
}
