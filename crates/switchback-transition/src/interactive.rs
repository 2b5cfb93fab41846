#![forbid(unsafe_code)]

//! Percent-driven control over one run.
//!
//! A controller exists only while a gesture is tracking; the director
//! creates it on gesture begin and drops it synchronously on finish or
//! cancel. Finishing resumes forward play from the scrubbed point;
//! cancelling reverses playback, and the run reports itself cancelled once
//! it rewinds to the origin.

use tracing::debug;

use crate::machine::TransitionRun;

/// Extra rewind margin before a cancelled run's snap-back deadline.
pub const CANCEL_GRACE: f64 = 0.1;

#[derive(Debug)]
pub struct InteractiveController {
    duration: f64,
    threshold: f64,
    percent: f64,
}

impl InteractiveController {
    /// # Panics
    ///
    /// The threshold must be strictly between zero and one.
    #[must_use]
    pub fn new(duration: f64, threshold: f64) -> Self {
        assert!(
            threshold > 0.0 && threshold < 1.0,
            "interactive threshold must be strictly inside (0, 1)"
        );
        Self {
            duration,
            threshold,
            percent: 0.0,
        }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scrub the run to `percent`, clamped to `[0, 1]`.
    pub fn update(&mut self, run: &mut TransitionRun, percent: f64) {
        let percent = percent.clamp(0.0, 1.0);
        self.percent = percent;
        run.scrub(percent);
    }

    /// Whether an ended gesture finishes (past the threshold) or cancels.
    #[must_use]
    pub fn past_threshold(&self) -> bool {
        self.percent > self.threshold
    }

    /// Resume forward play from the scrubbed point. Consumes the
    /// controller: interactivity ends here.
    pub fn finish(self, run: &mut TransitionRun, now: f64) {
        debug!(percent = self.percent, "interactive finish");
        run.resume(now);
    }

    /// Reverse playback from the scrubbed point. Returns the snap-back
    /// deadline: the host time by which the rewind must have completed.
    pub fn cancel(self, run: &mut TransitionRun, now: f64) -> f64 {
        debug!(percent = self.percent, "interactive cancel");
        run.cancel(now);
        now + (1.0 - self.percent) * self.duration + CANCEL_GRACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "strictly inside")]
    fn zero_threshold_is_rejected() {
        let _ = InteractiveController::new(0.5, 0.0);
    }

    #[test]
    #[should_panic(expected = "strictly inside")]
    fn one_threshold_is_rejected() {
        let _ = InteractiveController::new(0.5, 1.0);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let mut ctrl = InteractiveController::new(0.5, 0.5);
        ctrl.percent = 0.5;
        assert!(!ctrl.past_threshold(), "exactly at threshold cancels");
        ctrl.percent = 0.500001;
        assert!(ctrl.past_threshold());
    }
}
