use std::time::Duration;

/// Timing and volume counters for the publish step.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublishProfile {
    pub publish_count: u64,
    pub last_publish_time: Duration,
    pub total_publish_time: Duration,
    pub last_pinned_copied: usize,
    pub node_count: usize,
    /// Publishes that ran past `ClothStateConfig::publish_budget_ms`.
    pub budget_overruns: u64,
}

impl PublishProfile {
    pub fn reset(&mut self) {
        *self = Self {
            node_count: self.node_count,
            ..Self::default()
        };
    }

    pub fn average_publish_time(&self) -> Duration {
        if self.publish_count == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.total_publish_time.as_secs_f64() / self.publish_count as f64)
    }

    pub(crate) fn record(&mut self, elapsed: Duration, pinned_copied: usize) {
        self.publish_count += 1;
        self.last_publish_time = elapsed;
        self.total_publish_time += elapsed;
        self.last_pinned_copied = pinned_copied;
    }

    pub fn report(&self) {
        if self.publish_count == 0 {
            return;
        }

        log::info!(
            "publish: {} nodes, {} pins, last {:.3} ms, avg {:.3} ms over {} publishes",
            self.node_count,
            self.last_pinned_copied,
            self.last_publish_time.as_secs_f32() * 1000.0,
            self.average_publish_time().as_secs_f32() * 1000.0,
            self.publish_count
        );
    }
}
