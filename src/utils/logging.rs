use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Measures one store phase and traces its start and end.
///
/// [`PhaseTimer::finish`] hands the elapsed time back so the caller can feed
/// it into [`crate::utils::profiling::PublishProfile`].
pub struct PhaseTimer {
    label: &'static str,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(label: &'static str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
        elapsed
    }
}

/// Warns when a publish took longer than the configured budget.
pub fn warn_if_publish_budget_exceeded(duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!("Publish exceeded budget: {elapsed_ms:.2} ms > {budget_ms:.2} ms");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_check_reports_overruns_only() {
        assert!(warn_if_publish_budget_exceeded(Duration::from_millis(5), 1.0));
        assert!(!warn_if_publish_budget_exceeded(Duration::from_micros(100), 1.0));
    }

    #[test]
    fn finish_returns_time_spent_in_phase() {
        let timer = PhaseTimer::start("test::phase");
        std::thread::sleep(Duration::from_millis(1));
        assert!(timer.finish() >= Duration::from_millis(1));
    }
}
