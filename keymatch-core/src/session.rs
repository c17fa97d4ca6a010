//! # Capture Session Module
//!
//! An explicit session object for live voice sampling. The session owns
//! the estimate window and walks a fixed lifecycle:
//!
//! `Open` → `Sampling` → `Closed`
//!
//! The caller owns the session and drives it: frames are fed at the
//! [`SAMPLE_INTERVAL`] cadence until the [`SESSION_BUDGET`] elapses, then
//! the window is reduced once. Frames fed outside the `Sampling` state
//! are ignored, never an error.

use crate::aggregate::{PitchWindow, ReduceMode};
use crate::pitch::PitchAlgorithm;
use std::time::{Duration, Instant};

/// Cadence at which a live capture loop should feed frames.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Total sampling time budget for one capture session.
pub const SESSION_BUDGET: Duration = Duration::from_secs(5);

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet sampling.
    Open,
    /// Actively accepting frames.
    Sampling,
    /// Finished; the window has been reduced and no more frames are taken.
    Closed,
}

/// A single live-capture analysis session.
///
/// Collects one pitch estimate per fed frame and reduces them with the
/// mean of the in-band survivors when finished. Each `feed` call is an
/// independent, side-effect-free estimation over the given frame; the
/// only state carried between calls is the append-only window.
#[derive(Debug)]
pub struct CaptureSession {
    state: SessionState,
    algorithm: PitchAlgorithm,
    window: PitchWindow,
    started_at: Option<Instant>,
}

impl CaptureSession {
    /// Opens a new session using the given estimation strategy.
    pub fn new(algorithm: PitchAlgorithm) -> Self {
        Self {
            state: SessionState::Open,
            algorithm,
            window: PitchWindow::new(),
            started_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of valid estimates collected so far.
    pub fn estimate_count(&self) -> usize {
        self.window.len()
    }

    /// Begins sampling. Only meaningful on an `Open` session.
    pub fn start(&mut self) {
        if self.state != SessionState::Open {
            eprintln!("[SESSION] start ignored in state {:?}", self.state);
            return;
        }
        self.state = SessionState::Sampling;
        self.started_at = Some(Instant::now());
    }

    /// Feeds one captured frame through the configured estimator.
    ///
    /// Ignored unless the session is `Sampling`. Absent and invalid
    /// estimates are dropped by the window at insertion.
    pub fn feed(&mut self, samples: &[f32], sample_rate: u32) {
        if self.state != SessionState::Sampling {
            eprintln!("[SESSION] frame ignored in state {:?}", self.state);
            return;
        }
        self.window.push(self.algorithm.estimate(samples, sample_rate));
    }

    /// Whether the sampling time budget has elapsed.
    pub fn budget_exhausted(&self) -> bool {
        self.started_at
            .is_some_and(|t| t.elapsed() >= SESSION_BUDGET)
    }

    /// Closes the session and reduces the window to the voice pitch.
    ///
    /// # Returns
    /// * `Some(frequency)` - Mean of the in-band estimates, in Hz
    /// * `None` - Nothing sampled, or no estimate survived filtering;
    ///   the caller must surface this as "no pitch found"
    pub fn finish(&mut self) -> Option<f32> {
        if self.state != SessionState::Sampling {
            eprintln!("[SESSION] finish ignored in state {:?}", self.state);
            return None;
        }
        self.state = SessionState::Closed;
        self.window.reduce(ReduceMode::MeanFiltered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44100;

    fn sine_frame(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.8 * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[test]
    fn session_walks_the_lifecycle() {
        let mut session = CaptureSession::new(PitchAlgorithm::Autocorrelation);
        assert_eq!(session.state(), SessionState::Open);
        session.start();
        assert_eq!(session.state(), SessionState::Sampling);

        let frame = sine_frame(220.0, 2048);
        for _ in 0..10 {
            session.feed(&frame, SAMPLE_RATE);
        }
        assert_eq!(session.estimate_count(), 10);

        let pitch = session.finish().expect("voiced session should have a pitch");
        assert_eq!(session.state(), SessionState::Closed);
        assert!((pitch - 220.0).abs() / 220.0 < 0.02, "got {pitch} Hz");
    }

    #[test]
    fn frames_outside_sampling_are_ignored() {
        let frame = sine_frame(220.0, 2048);

        let mut session = CaptureSession::new(PitchAlgorithm::Autocorrelation);
        session.feed(&frame, SAMPLE_RATE); // still Open
        assert_eq!(session.estimate_count(), 0);

        session.start();
        session.feed(&frame, SAMPLE_RATE);
        session.finish();
        session.feed(&frame, SAMPLE_RATE); // Closed
        assert_eq!(session.estimate_count(), 1);
    }

    #[test]
    fn finish_without_sampling_yields_none() {
        let mut session = CaptureSession::new(PitchAlgorithm::DifferenceFunction);
        assert_eq!(session.finish(), None);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn silent_session_yields_none() {
        let mut session = CaptureSession::new(PitchAlgorithm::Autocorrelation);
        session.start();
        let silence = vec![0.0f32; 2048];
        for _ in 0..10 {
            session.feed(&silence, SAMPLE_RATE);
        }
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn out_of_band_voice_yields_none() {
        // 1 kHz is detectable but lies above the (50, 500) Hz vocal band,
        // so the reduction discards every estimate.
        let mut session = CaptureSession::new(PitchAlgorithm::Autocorrelation);
        session.start();
        let frame = sine_frame(1000.0, 2048);
        for _ in 0..5 {
            session.feed(&frame, SAMPLE_RATE);
        }
        assert!(session.estimate_count() > 0);
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn difference_function_session_detects_voice() {
        // Frames a few periods long keep the difference detector on the
        // fundamental dip.
        let mut session = CaptureSession::new(PitchAlgorithm::DifferenceFunction);
        session.start();
        let frame = sine_frame(110.0, 1200);
        for _ in 0..5 {
            session.feed(&frame, SAMPLE_RATE);
        }
        let pitch = session.finish().expect("voiced session should have a pitch");
        assert!((pitch - 110.0).abs() / 110.0 < 0.02, "got {pitch} Hz");
    }
}
