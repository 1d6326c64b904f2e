//! Experience: the unit of learning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::incident::{IncidentSeverity, IncidentType, SystemMetrics};

/// One completed remediation cycle, captured for future planning.
///
/// Append-only: exactly one record per completed cycle, owned by the
/// experience store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    /// Unique identifier.
    pub id: Uuid,
    /// Class of the remediated incident.
    pub incident_type: IncidentType,
    /// Severity of the remediated incident.
    pub severity: IncidentSeverity,
    /// Metrics observed at detection.
    pub metrics_before: SystemMetrics,
    /// Strategy the bandit selected.
    pub strategy_used: String,
    /// Tools of actions that were dispatched, in dispatch order.
    pub actions_executed: Vec<String>,
    /// Tools of actions that were blocked, with no dispatch.
    pub actions_skipped: Vec<String>,
    /// Metrics observed after execution.
    pub metrics_after: SystemMetrics,
    /// Accumulated recovery time across dispatched actions.
    pub recovery_time_seconds: f64,
    /// Accumulated infrastructure cost across dispatched actions.
    pub cost: f64,
    /// Deterministic reward from the numeric formula.
    pub numeric_reward: f64,
    /// Clamped oracle adjustment; 0 when the oracle was unavailable.
    pub judged_adjustment: f64,
    /// `numeric_reward + judged_adjustment`; what the bandit learns from.
    pub final_reward: f64,
    /// Whether the service ended the cycle restored.
    pub service_restored: bool,
    /// Whether the strategy was picked by exploration.
    pub explored: bool,
    /// Index of the cycle within the learning session.
    pub cycle_index: u32,
    /// When the experience was committed.
    pub recorded_at: DateTime<Utc>,
}

impl Experience {
    /// One-line summary for logs and reports.
    pub fn summary(&self) -> String {
        format!(
            "{} via {} -> reward {:.2} ({}{})",
            self.incident_type,
            self.strategy_used,
            self.final_reward,
            if self.service_restored { "restored" } else { "not restored" },
            if self.explored { ", explored" } else { "" },
        )
    }
}
