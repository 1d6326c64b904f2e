//! Reward model: scores one completed remediation cycle.
//!
//! The numeric reward is a pure function of the metric snapshots, the
//! recovery time and the cost; given identical inputs it is bit-identical
//! across calls. The oracle adjustment is layered on top by the control
//! loop, clamped and defaulting to zero.

use serde::{Deserialize, Serialize};

use crate::domain::models::{RewardConfig, SystemMetrics};

/// Component-by-component breakdown of one reward computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Whether the after-metrics qualify as a restored service.
    pub service_restored: bool,
    /// Flat restoration bonus (0 when not restored).
    pub base: f64,
    pub latency_gain: f64,
    pub availability_gain: f64,
    pub cpu_gain: f64,
    pub memory_gain: f64,
    pub recovery_penalty: f64,
    pub cost_penalty: f64,
    pub error_penalty: f64,
    /// `base + gains - penalties`.
    pub numeric_reward: f64,
}

impl RewardBreakdown {
    /// Sum of the improvement components.
    pub fn improvement(&self) -> f64 {
        self.latency_gain + self.availability_gain + self.cpu_gain + self.memory_gain
    }

    /// Sum of the penalty components.
    pub fn penalty(&self) -> f64 {
        self.recovery_penalty + self.cost_penalty + self.error_penalty
    }
}

/// Deterministic reward scorer.
pub struct RewardModel {
    config: RewardConfig,
}

impl RewardModel {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Create a model with the documented default coefficients.
    pub fn with_defaults() -> Self {
        Self::new(RewardConfig::default())
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Whether the after-metrics qualify as a restored service.
    pub fn service_restored(&self, after: &SystemMetrics) -> bool {
        after.availability >= self.config.restored_availability
            && after.error_rate < self.config.restored_error_rate
    }

    /// Score one cycle.
    ///
    /// Deltas are signed (before − after for metrics where lower is
    /// better, after − before for availability), so a remediation that
    /// makes things worse scores negative improvements.
    pub fn evaluate(
        &self,
        before: &SystemMetrics,
        after: &SystemMetrics,
        recovery_time_seconds: f64,
        infrastructure_cost: f64,
    ) -> RewardBreakdown {
        let cfg = &self.config;
        let service_restored = self.service_restored(after);

        let base = if service_restored { cfg.restored_bonus } else { 0.0 };
        let latency_gain = cfg.latency_weight * (before.latency_ms - after.latency_ms);
        let availability_gain =
            cfg.availability_weight * (after.availability - before.availability);
        let cpu_gain = cfg.cpu_weight * (before.cpu_percent - after.cpu_percent);
        let memory_gain = cfg.memory_weight * (before.memory_percent - after.memory_percent);

        let recovery_penalty = cfg.recovery_time_penalty * recovery_time_seconds;
        let cost_penalty = cfg.cost_penalty * infrastructure_cost;
        let error_penalty = cfg.error_rate_penalty * after.error_rate;

        let numeric_reward = base + latency_gain + availability_gain + cpu_gain + memory_gain
            - recovery_penalty
            - cost_penalty
            - error_penalty;

        RewardBreakdown {
            service_restored,
            base,
            latency_gain,
            availability_gain,
            cpu_gain,
            memory_gain,
            recovery_penalty,
            cost_penalty,
            error_penalty,
            numeric_reward,
        }
    }
}
