use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{RemediationAction, SystemMetrics};

/// What one dispatched action did to the system.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Whether the action took full effect (a failed action may still
    /// recover the system partially).
    pub succeeded: bool,
    /// Infrastructure cost billed for the action.
    pub cost: f64,
    /// Wall-clock recovery time the action consumed, in seconds.
    pub recovery_time_seconds: f64,
    /// Metrics after the action was applied.
    pub metrics: SystemMetrics,
    /// Executor's description of what happened.
    pub message: String,
}

/// Dispatches remediation actions against the (simulated) system.
///
/// Called only after an allow or warn guardrail verdict; blocked actions
/// never reach the executor.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Apply one remediation action.
    async fn dispatch(&self, action: &RemediationAction) -> Result<ActionOutcome>;
}
