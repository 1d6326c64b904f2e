use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{Incident, SystemMetrics};

/// Everything the oracle gets to see when judging a remediation.
#[derive(Debug, Clone)]
pub struct JudgeRequest<'a> {
    pub incident: &'a Incident,
    pub strategy_name: &'a str,
    pub metrics_before: &'a SystemMetrics,
    pub metrics_after: &'a SystemMetrics,
    pub recovery_time_seconds: f64,
    pub numeric_reward: f64,
}

/// Bounds of the oracle's adjustment, in reward points.
pub const ADJUSTMENT_BOUND: f64 = 20.0;

/// External qualitative judgment source. Advisory only.
///
/// Returns an adjustment in `[-ADJUSTMENT_BOUND, ADJUSTMENT_BOUND]` to be
/// added to the numeric reward. The caller clamps the value and treats any
/// error as a zero adjustment; an unavailable oracle must never fail a
/// cycle.
#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    /// Judge one completed remediation.
    async fn judge(&self, request: &JudgeRequest<'_>) -> Result<f64>;
}
