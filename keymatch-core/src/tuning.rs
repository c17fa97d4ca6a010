//! # Semitone Mapping Module
//!
//! Equal-tempered pitch arithmetic: converts a pair of absolute pitches
//! (song material vs. target voice) into the integer number of semitones
//! the song must be transposed by. Positions are measured from a fixed
//! reference of C0 and truncated toward negative infinity — the floor is
//! a deliberate bucket boundary, not a rounding artifact, and must hold
//! for pitches below the reference as well.

use crate::TransposePlan;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Reference pitch for semitone positions: equal-tempered C0, in Hz.
pub const C0_HZ: f64 = 16.35;

/// Invalid input to the semitone mapper.
///
/// The mapper never crashes on bad pitches; it reports the condition and
/// leaves the fallback policy (e.g. assuming a zero shift) to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TuningError {
    #[error("{0} Hz is not a valid pitch; expected a finite, positive frequency")]
    InvalidPitch(f32),
}

/// Note names used for display, one octave starting at C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Statically computed equal-tempered notes from C0 to B8.
///
/// Used only for labeling detected pitches in the frontend; the shift
/// arithmetic itself works directly on frequencies.
static NOTES: Lazy<Vec<(String, f32)>> = Lazy::new(|| {
    (0..108)
        .map(|i| {
            let name = format!("{}{}", NOTE_NAMES[i % 12], i / 12);
            let frequency = (C0_HZ * 2.0_f64.powf(i as f64 / 12.0)) as f32;
            (name, frequency)
        })
        .collect()
});

fn valid(pitch: f32) -> Result<f64, TuningError> {
    if pitch.is_finite() && pitch > 0.0 {
        Ok(pitch as f64)
    } else {
        Err(TuningError::InvalidPitch(pitch))
    }
}

/// Semitone position of a pitch relative to C0.
///
/// `floor(12 * log2(pitch / C0))` — the bucket index of the equal-tempered
/// semitone the pitch falls into. Truncation toward negative infinity is
/// load-bearing: a pitch below C0 lands in a negative bucket, never in
/// bucket zero.
///
/// The caller must have validated the pitch; this function assumes a
/// finite, positive input.
fn semitone_position(pitch: f64) -> i32 {
    (12.0 * (pitch / C0_HZ).log2()).floor() as i32
}

/// Computes the semitone shift that moves `source_pitch` to `target_pitch`.
///
/// # Arguments
/// * `source_pitch` - Pitch of the material to transpose, in Hz
/// * `target_pitch` - Pitch it should be moved toward, in Hz
///
/// # Returns
/// * `Ok(shift)` - Signed semitone count (positive = transpose up)
/// * `Err(TuningError::InvalidPitch)` - Either input was non-finite or
///   not strictly positive
pub fn semitone_shift(source_pitch: f32, target_pitch: f32) -> Result<i32, TuningError> {
    let source = valid(source_pitch)?;
    let target = valid(target_pitch)?;
    Ok(semitone_position(target) - semitone_position(source))
}

/// Builds the full transposition plan for a song/voice pitch pair.
pub fn plan_transposition(song_pitch: f32, voice_pitch: f32) -> Result<TransposePlan, TuningError> {
    let shift = semitone_shift(song_pitch, voice_pitch)?;
    Ok(TransposePlan {
        song_pitch,
        voice_pitch,
        semitone_shift: shift,
    })
}

/// Finds the closest equal-tempered note to a frequency, for display.
///
/// # Returns
/// * `(note_name, note_frequency)` - Nearest note in the C0..B8 table
pub fn nearest_note_name(freq: f32) -> (String, f32) {
    let closest = NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.1 - freq).abs();
            let diff_b = (b.1 - freq).abs();
            diff_a.partial_cmp(&diff_b).unwrap()
        })
        .unwrap(); // Safe: NOTES is never empty.

    (closest.0.clone(), closest.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_pitches_shift_zero() {
        // Including exact semitone boundaries, where floor behavior bites.
        for n in 0..48 {
            let p = (C0_HZ * 2.0_f64.powf(n as f64 / 12.0)) as f32;
            assert_eq!(
                semitone_shift(p, p),
                Ok(0),
                "shift({p}, {p}) should be 0 at boundary n={n}"
            );
        }
        assert_eq!(semitone_shift(123.45, 123.45), Ok(0));
    }

    #[test]
    fn octave_up_is_twelve_semitones() {
        assert_eq!(semitone_shift(440.0, 880.0), Ok(12));
        assert_eq!(semitone_shift(880.0, 440.0), Ok(-12));
    }

    #[test]
    fn shift_is_monotonic_in_target() {
        let source = 220.0f32;
        let mut previous = i32::MIN;
        let mut target = 60.0f32;
        while target < 1000.0 {
            let shift = semitone_shift(source, target).unwrap();
            assert!(
                shift >= previous,
                "shift decreased at target {target}: {shift} < {previous}"
            );
            previous = shift;
            target *= 1.01;
        }
    }

    #[test]
    fn floor_holds_below_the_reference() {
        // 10 Hz is 8.51 semitones below C0: floor(-8.51) = -9, not -8.
        assert_eq!(semitone_shift((C0_HZ) as f32, 10.0), Ok(-9));
    }

    #[test]
    fn invalid_pitches_are_reported() {
        for bad in [0.0f32, -5.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(semitone_shift(bad, 440.0).is_err(), "{bad} accepted as source");
            assert!(semitone_shift(440.0, bad).is_err(), "{bad} accepted as target");
        }
    }

    #[test]
    fn plan_carries_both_pitches_and_shift() {
        let plan = plan_transposition(440.0, 880.0).unwrap();
        assert_eq!(plan.song_pitch, 440.0);
        assert_eq!(plan.voice_pitch, 880.0);
        assert_eq!(plan.semitone_shift, 12);
    }

    #[test]
    fn nearest_note_labels_a4() {
        let (name, freq) = nearest_note_name(440.0);
        assert_eq!(name, "A4");
        assert!((freq - 440.0).abs() < 1.0);
    }

    #[test]
    fn nearest_note_labels_c0() {
        let (name, _) = nearest_note_name(16.4);
        assert_eq!(name, "C0");
    }
}
