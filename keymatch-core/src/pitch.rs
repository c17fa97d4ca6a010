//! # Pitch Detection Module
//!
//! Two interchangeable fundamental-frequency estimators over a single
//! frame of audio samples:
//!
//! - a normalized squared-difference detector (YIN-style) that picks the
//!   first lag whose cumulative-mean-normalized difference dips below a
//!   fixed threshold, and
//! - an autocorrelation detector that tracks the first correlation peak
//!   with a rise-then-fall heuristic and refines it by interpolation.
//!
//! Both are pure functions of `(samples, sample_rate)` and report the
//! absence of a pitch as `None` — never a sentinel value. All tunables
//! are fixed, named constants; nothing is configurable at call time.

use serde::{Deserialize, Serialize};

/// Normalized-difference threshold for the YIN-style detector.
pub const DIFFERENCE_THRESHOLD: f32 = 0.10;

/// Lower bound of the difference detector's accept band, in Hz.
pub const MIN_DETECT_HZ: f32 = 100.0;

/// Upper bound of the difference detector's accept band, in Hz.
pub const MAX_DETECT_HZ: f32 = 5000.0;

/// RMS level below which a frame is treated as silence.
pub const RMS_SILENCE_GATE: f32 = 0.01;

/// Correlation level that marks a peak as trustworthy.
pub const GOOD_CORRELATION: f32 = 0.9;

/// Minimum correlation for the full-scan fallback path.
pub const MIN_CORRELATION: f32 = 0.01;

/// Empirical smoothing constant applied to the interpolated lag offset.
/// Kept at its historical value for behavioral parity.
pub const INTERPOLATION_FACTOR: f32 = 8.0;

/// The pitch-estimation strategy to run on a frame.
///
/// Both variants satisfy the same contract and are selected by caller
/// policy rather than hardwired into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitchAlgorithm {
    /// Normalized squared-difference (YIN-style) detection.
    #[default]
    DifferenceFunction,
    /// Windowed absolute-difference autocorrelation with peak interpolation.
    Autocorrelation,
}

impl PitchAlgorithm {
    /// Estimates the fundamental frequency of one sample frame.
    ///
    /// # Arguments
    /// * `samples` - Amplitude samples in [-1, 1]
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected fundamental in Hz
    /// * `None` - No pitch found (silence, noise, or out-of-range result)
    pub fn estimate(&self, samples: &[f32], sample_rate: u32) -> Option<f32> {
        match self {
            PitchAlgorithm::DifferenceFunction => detect_pitch_difference(samples, sample_rate),
            PitchAlgorithm::Autocorrelation => detect_pitch_autocorrelation(samples, sample_rate),
        }
    }
}

/// Detects pitch with a cumulative-mean-normalized difference function.
///
/// The classic YIN recipe over the half-length lag range:
/// 1. Squared-difference function `d(t)` for each lag `t` in `[1, N/2)`
/// 2. Cumulative mean normalization: `d(t) * t / running_sum`
/// 3. The chosen lag is the minimum normalized value below
///    [`DIFFERENCE_THRESHOLD`], first occurrence winning ties, which
///    favors the lowest plausible fundamental over octave-high dips
/// 4. `frequency = sample_rate / t`, accepted only inside
///    `[MIN_DETECT_HZ, MAX_DETECT_HZ]`
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No lag dipped below the threshold, or the result fell
///   outside the accept band
pub fn detect_pitch_difference(samples: &[f32], sample_rate: u32) -> Option<f32> {
    let half = samples.len() / 2;
    if half < 2 {
        return None;
    }

    // Step 1: squared-difference function over the half-length lag range.
    let mut diff = vec![0.0f32; half];
    for tau in 1..half {
        let mut sum = 0.0f32;
        for i in 0..half {
            let delta = samples[i] - samples[i + tau];
            sum += delta * delta;
        }
        diff[tau] = sum;
    }

    // Step 2: cumulative mean normalization. `tau` starts at 1 and the
    // running sum accumulates from there, so no explicit zero guard is
    // needed; an all-zero frame normalizes to NaN and fails the
    // threshold comparison below.
    let mut running_sum = 0.0f32;
    for tau in 1..half {
        running_sum += diff[tau];
        diff[tau] *= tau as f32 / running_sum;
    }

    // Step 3: minimum normalized value below the threshold. Strict
    // comparison keeps the earliest lag on ties.
    let mut chosen: Option<usize> = None;
    for tau in 1..half {
        if diff[tau] < DIFFERENCE_THRESHOLD && chosen.is_none_or(|c| diff[tau] < diff[c]) {
            chosen = Some(tau);
        }
    }

    // Step 4: lag to frequency, gated to the plausible voice range.
    let tau = chosen?;
    let frequency = sample_rate as f32 / tau as f32;
    if (MIN_DETECT_HZ..=MAX_DETECT_HZ).contains(&frequency) {
        Some(frequency)
    } else {
        None
    }
}

/// Detects pitch with an absolute-difference autocorrelation scan.
///
/// Frames quieter than [`RMS_SILENCE_GATE`] are rejected outright. The
/// scan computes `correlation = 1 - Σ|x[i] - x[i+k]| / (N/2)` for each
/// lag `k` and watches for a rise-then-fall around a correlation above
/// [`GOOD_CORRELATION`]: the moment the correlation drops after such a
/// peak, the scan short-circuits on the assumption that the first peak
/// is the fundamental (higher lags belong to subharmonics). The peak lag
/// is refined with a parabolic shift scaled by [`INTERPOLATION_FACTOR`].
///
/// If the scan completes without short-circuiting, the best peak found
/// is used as long as its correlation exceeds [`MIN_CORRELATION`].
///
/// No frequency-range gate is applied here; range filtering is deferred
/// to the aggregator.
pub fn detect_pitch_autocorrelation(samples: &[f32], sample_rate: u32) -> Option<f32> {
    let half = samples.len() / 2;
    if half == 0 {
        return None;
    }

    // Silence gate.
    let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    if rms < RMS_SILENCE_GATE {
        return None;
    }

    let mut correlations = vec![0.0f32; half];
    let mut best_correlation = 0.0f32;
    let mut best_offset = 0usize;
    let mut last_correlation = 1.0f32;
    let mut found_good_correlation = false;

    for offset in 0..half {
        let mut sum = 0.0f32;
        for i in 0..half {
            sum += (samples[i] - samples[i + offset]).abs();
        }
        let correlation = 1.0 - sum / half as f32;
        correlations[offset] = correlation;

        if correlation > GOOD_CORRELATION && correlation > last_correlation {
            found_good_correlation = true;
            if correlation > best_correlation {
                best_correlation = correlation;
                best_offset = offset;
            }
        } else if found_good_correlation {
            // First drop after a good peak: refine and stop scanning.
            // `best_offset` is at least 1 (lag 0 correlates at exactly 1.0
            // and can never exceed the previous value), and at most
            // `offset - 1`, so both neighbors are already computed.
            let shift = (correlations[best_offset + 1] - correlations[best_offset - 1])
                / correlations[best_offset];
            let refined = best_offset as f32 + INTERPOLATION_FACTOR * shift;
            return Some(sample_rate as f32 / refined);
        }
        last_correlation = correlation;
    }

    if best_correlation > MIN_CORRELATION {
        return Some(sample_rate as f32 / best_offset as f32);
    }
    None
}
