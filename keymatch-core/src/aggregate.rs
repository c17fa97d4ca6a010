//! # Estimate Aggregation Module
//!
//! Collects per-frame pitch estimates into a window and reduces them to a
//! single representative pitch. Estimates outside the plausible vocal band
//! are discarded at reduction time; non-finite and non-positive values are
//! refused at insertion. Also hosts the whole-file sweep that applies an
//! estimator over overlapping frames of a decoded buffer.

use crate::audio::FRAME_SIZE;
use crate::pitch::PitchAlgorithm;

/// Lower edge of the plausible vocal band, in Hz (exclusive).
pub const VOCAL_BAND_MIN_HZ: f32 = 50.0;

/// Upper edge of the plausible vocal band, in Hz (exclusive).
pub const VOCAL_BAND_MAX_HZ: f32 = 500.0;

/// Hop between successive analysis frames when sweeping a buffer.
pub const HOP_SIZE: usize = 512;

/// How much leading audio the whole-file sweep inspects, in seconds.
pub const ANALYZE_BUDGET_SECS: u32 = 30;

/// How a window of estimates is reduced to one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceMode {
    /// Arithmetic mean of the surviving estimates; used for live capture.
    MeanFiltered,
    /// Ascending-sort median (lower-middle on even counts); used for
    /// whole-file analysis, more robust against transient spikes.
    Median,
}

/// An append-only window of pitch estimates from one analysis session.
///
/// Only finite, strictly positive frequencies are accepted; `None`
/// estimates and numerically invalid values are dropped at the door so
/// the reduction step never sees them.
#[derive(Debug, Clone, Default)]
pub struct PitchWindow {
    estimates: Vec<f32>,
}

impl PitchWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a per-frame estimate, ignoring absent or invalid values.
    pub fn push(&mut self, estimate: Option<f32>) {
        if let Some(freq) = estimate
            && freq.is_finite()
            && freq > 0.0
        {
            self.estimates.push(freq);
        }
    }

    /// Number of estimates collected so far.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Reduces the window to a single representative pitch.
    ///
    /// Estimates outside the open vocal band
    /// ([`VOCAL_BAND_MIN_HZ`], [`VOCAL_BAND_MAX_HZ`]) are discarded first;
    /// this is a second, stricter filter than anything the estimators
    /// apply internally. If nothing survives, the result is `None` —
    /// the caller must surface that as an error state, never as 0 Hz.
    ///
    /// The reduction is deterministic for a given window content: the
    /// median path sorts ascending, so ties are broken by value order
    /// rather than insertion order.
    pub fn reduce(&self, mode: ReduceMode) -> Option<f32> {
        let mut surviving: Vec<f32> = self
            .estimates
            .iter()
            .copied()
            .filter(|f| *f > VOCAL_BAND_MIN_HZ && *f < VOCAL_BAND_MAX_HZ)
            .collect();

        if surviving.is_empty() {
            return None;
        }

        match mode {
            ReduceMode::MeanFiltered => {
                Some(surviving.iter().sum::<f32>() / surviving.len() as f32)
            }
            ReduceMode::Median => {
                surviving.sort_by(|a, b| a.total_cmp(b));
                // Lower-middle element on even counts.
                Some(surviving[(surviving.len() - 1) / 2])
            }
        }
    }
}

/// Estimates the representative pitch of a whole audio buffer.
///
/// Sweeps overlapping [`FRAME_SIZE`] frames at a [`HOP_SIZE`] hop across
/// at most the first [`ANALYZE_BUDGET_SECS`] seconds of the buffer,
/// collects the per-frame estimates, and reduces them with the median
/// (the robust choice for file analysis).
///
/// # Arguments
/// * `samples` - Mono amplitude samples in [-1, 1]
/// * `sample_rate` - Sample rate in Hz
/// * `algorithm` - Which estimator to run per frame
///
/// # Returns
/// * `Some(frequency)` - Median pitch of the voiced frames, in Hz
/// * `None` - No frame produced an in-band estimate
pub fn analyze_buffer(samples: &[f32], sample_rate: u32, algorithm: PitchAlgorithm) -> Option<f32> {
    let budget = (ANALYZE_BUDGET_SECS as usize).saturating_mul(sample_rate as usize);
    let scan = &samples[..samples.len().min(budget)];

    let mut window = PitchWindow::new();
    let mut start = 0;
    while start + FRAME_SIZE <= scan.len() {
        let frame = &scan[start..start + FRAME_SIZE];
        window.push(algorithm.estimate(frame, sample_rate));
        start += HOP_SIZE;
    }

    window.reduce(ReduceMode::Median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn window_of(values: &[f32]) -> PitchWindow {
        let mut window = PitchWindow::new();
        for &v in values {
            window.push(Some(v));
        }
        window
    }

    #[test]
    fn push_refuses_invalid_values() {
        let mut window = PitchWindow::new();
        window.push(None);
        window.push(Some(f32::NAN));
        window.push(Some(f32::INFINITY));
        window.push(Some(0.0));
        window.push(Some(-220.0));
        assert!(window.is_empty());

        window.push(Some(220.0));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn median_discards_out_of_band_outlier() {
        let window = window_of(&[110.0, 115.0, 1000.0, 112.0]);
        assert_eq!(window.reduce(ReduceMode::Median), Some(112.0));
    }

    #[test]
    fn median_takes_lower_middle_on_even_count() {
        let window = window_of(&[100.0, 200.0, 300.0, 400.0]);
        assert_eq!(window.reduce(ReduceMode::Median), Some(200.0));
    }

    #[test]
    fn mean_is_arithmetic_mean_of_survivors() {
        // 40 and 900 fall outside the (50, 500) band.
        let window = window_of(&[40.0, 100.0, 200.0, 900.0]);
        assert_eq!(window.reduce(ReduceMode::MeanFiltered), Some(150.0));
    }

    #[test]
    fn empty_surviving_set_reduces_to_none() {
        let window = window_of(&[20.0, 600.0, 5000.0]);
        assert_eq!(window.reduce(ReduceMode::MeanFiltered), None);
        assert_eq!(window.reduce(ReduceMode::Median), None);
        assert_eq!(PitchWindow::new().reduce(ReduceMode::MeanFiltered), None);
    }

    #[test]
    fn band_edges_are_exclusive() {
        let window = window_of(&[50.0, 500.0]);
        assert_eq!(window.reduce(ReduceMode::MeanFiltered), None);
    }

    #[test]
    fn sweep_finds_pitch_of_sine_buffer() {
        let sample_rate = 44100u32;
        let freq = 440.0f32;
        let samples: Vec<f32> = (0..sample_rate as usize)
            .map(|i| 0.8 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();

        let detected = analyze_buffer(&samples, sample_rate, PitchAlgorithm::Autocorrelation)
            .expect("sine buffer should have a pitch");
        let error = (detected - freq).abs() / freq;
        assert!(error < 0.02, "expected ~{freq} Hz, got {detected} Hz");
    }

    #[test]
    fn sweep_of_silence_yields_none() {
        let samples = vec![0.0f32; 44100];
        assert_eq!(
            analyze_buffer(&samples, 44100, PitchAlgorithm::Autocorrelation),
            None
        );
        assert_eq!(
            analyze_buffer(&samples, 44100, PitchAlgorithm::DifferenceFunction),
            None
        );
    }

    #[test]
    fn sweep_of_short_buffer_yields_none() {
        // Shorter than one analysis frame.
        let samples = vec![0.5f32; 100];
        assert_eq!(
            analyze_buffer(&samples, 44100, PitchAlgorithm::Autocorrelation),
            None
        );
    }
}
