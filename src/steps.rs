/// Bookkeeping for the platform's cumulative step counter.
///
/// The first reading becomes the baseline for both the displayed step total
/// and the per-inference delta.
#[derive(Debug, Clone, Default)]
pub struct StepTracker {
    initial: Option<f64>,
    last: Option<f64>,
    at_last_inference: Option<f64>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, steps: f64) {
        if self.initial.is_none() {
            self.initial = Some(steps);
            self.at_last_inference = Some(steps);
        }
        self.last = Some(steps);
    }

    /// Steps since the first reading, if any reading arrived yet.
    pub fn steps_since_start(&self) -> Option<f64> {
        Some(self.last? - self.initial?)
    }

    /// Steps registered since the previous call; rebases the inference mark.
    ///
    /// Without any pedometer reading the delta is zero.
    pub fn take_delta(&mut self) -> f64 {
        match (self.last, self.at_last_inference) {
            (Some(last), Some(mark)) => {
                self.at_last_inference = Some(last);
                last - mark
            }
            _ => 0.0,
        }
    }

    /// Give back a delta taken by `take_delta` whose window was never
    /// classified, so those steps count toward the next one.
    pub fn restore_delta(&mut self, delta: f64) {
        if let Some(mark) = self.at_last_inference.as_mut() {
            *mark -= delta;
        }
    }

    pub fn has_readings(&self) -> bool {
        self.last.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_readings() {
        let mut steps = StepTracker::new();
        assert_eq!(steps.steps_since_start(), None);
        assert_eq!(steps.take_delta(), 0.0);
        assert!(!steps.has_readings());
    }

    #[test]
    fn test_delta_rebases() {
        let mut steps = StepTracker::new();
        steps.record(1200.0);
        steps.record(1203.0);
        assert_eq!(steps.steps_since_start(), Some(3.0));
        assert_eq!(steps.take_delta(), 3.0);
        assert_eq!(steps.take_delta(), 0.0);

        steps.record(1204.0);
        assert_eq!(steps.take_delta(), 1.0);
        assert_eq!(steps.steps_since_start(), Some(4.0));
    }

    #[test]
    fn test_restored_delta_counts_again() {
        let mut steps = StepTracker::new();
        steps.record(100.0);
        steps.record(105.0);
        let delta = steps.take_delta();
        steps.restore_delta(delta);

        steps.record(106.0);
        assert_eq!(steps.take_delta(), 6.0);
    }

    #[test]
    fn test_restore_without_readings_is_noop() {
        let mut steps = StepTracker::new();
        steps.restore_delta(3.0);
        assert_eq!(steps.take_delta(), 0.0);
    }
}
