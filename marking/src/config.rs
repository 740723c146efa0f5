use std::time::Duration;

use db::models::grading_unit::ClaimOrder;
use util::config::AppConfig;

/// Shortest pause between two poller cycles, even when woken early.
pub const MIN_CYCLE_GAP: Duration = Duration::from_millis(100);

/// Runtime settings of one marking node.
#[derive(Debug, Clone)]
pub struct MarkingConfig {
    /// Written into `claimed_by` for diagnostics.
    pub node_id: String,
    /// Number of worker tasks.
    pub workers: usize,
    /// Pause between poller cycles.
    pub poll_interval: Duration,
    /// Age after which a claim is considered abandoned.
    pub work_timeout: Duration,
    /// In-process queue capacity; also the largest claim batch.
    pub queue_capacity: usize,
    pub claim_order: ClaimOrder,
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            node_id: format!("node-{}", std::process::id()),
            workers: 4,
            poll_interval: Duration::from_millis(10_000),
            work_timeout: Duration::from_millis(120_000),
            queue_capacity: 16,
            claim_order: ClaimOrder::OldestFirst,
        }
    }
}

impl MarkingConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        let claim_order = cfg.marking_claim_order.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to oldest-first claim order");
            ClaimOrder::OldestFirst
        });

        Self {
            node_id: cfg.node_id.clone(),
            workers: cfg.marking_threads,
            poll_interval: Duration::from_millis(cfg.marking_poll_interval_ms),
            work_timeout: Duration::from_millis(cfg.marking_work_timeout_ms),
            queue_capacity: cfg.marking_fetch_rate,
            claim_order,
        }
        .clamped()
    }

    /// Reads the process-wide [`AppConfig`].
    pub fn from_env() -> Self {
        Self::from_app_config(&AppConfig::global())
    }

    /// Forces every value into its usable range.
    pub fn clamped(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.queue_capacity = self.queue_capacity.max(1);
        self.poll_interval = self.poll_interval.max(MIN_CYCLE_GAP);
        self
    }

    pub(crate) fn claim_timeout(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.work_timeout).unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_raises_zero_values() {
        let cfg = MarkingConfig {
            workers: 0,
            queue_capacity: 0,
            poll_interval: Duration::ZERO,
            ..MarkingConfig::default()
        }
        .clamped();

        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.queue_capacity, 1);
        assert_eq!(cfg.poll_interval, MIN_CYCLE_GAP);
    }

    #[test]
    fn claim_timeout_converts_milliseconds() {
        let cfg = MarkingConfig {
            work_timeout: Duration::from_millis(1_500),
            ..MarkingConfig::default()
        };
        assert_eq!(cfg.claim_timeout(), chrono::Duration::milliseconds(1_500));
    }
}
