//! Remediation strategy domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::incident::IncidentType;

/// Discrete remediation steps the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationActionType {
    RestartService,
    ScaleHorizontal,
    ScaleVertical,
    ChangeTimeout,
    RollbackDeployment,
    ClearCache,
    RebalanceLoad,
}

impl RemediationActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestartService => "restart_service",
            Self::ScaleHorizontal => "scale_horizontal",
            Self::ScaleVertical => "scale_vertical",
            Self::ChangeTimeout => "change_timeout",
            Self::RollbackDeployment => "rollback_deployment",
            Self::ClearCache => "clear_cache",
            Self::RebalanceLoad => "rebalance_load",
        }
    }

    /// Nominal cost of one invocation, before parameter scaling.
    ///
    /// Used by the guardrail cost-budget rule as the estimate for a
    /// proposed action, and by the simulator as the billing base.
    pub fn base_cost(&self) -> f64 {
        match self {
            Self::RestartService | Self::ClearCache => 0.1,
            Self::ScaleHorizontal => 2.0,
            Self::ScaleVertical => 1.5,
            Self::ChangeTimeout => 0.05,
            Self::RollbackDeployment => 0.5,
            Self::RebalanceLoad => 0.3,
        }
    }
}

impl std::fmt::Display for RemediationActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for an action. Only the fields relevant to the action type
/// are set; the rest stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParameters {
    /// Target instance count for horizontal scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_instances: Option<u32>,
    /// Target CPU cores for vertical scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_cpu: Option<f64>,
    /// Target memory in GB for vertical scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_memory_gb: Option<f64>,
    /// New timeout in milliseconds for timeout changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_timeout_ms: Option<u32>,
}

/// A single remediation step within a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    /// What to do.
    pub action: RemediationActionType,
    /// How to do it.
    #[serde(default)]
    pub parameters: ActionParameters,
    /// Human-readable description of the step.
    #[serde(default)]
    pub description: String,
}

impl RemediationAction {
    pub fn new(action: RemediationActionType, description: impl Into<String>) -> Self {
        Self {
            action,
            parameters: ActionParameters::default(),
            description: description.into(),
        }
    }

    /// Set a horizontal scaling target.
    pub fn with_target_instances(mut self, target: u32) -> Self {
        self.parameters.target_instances = Some(target);
        self
    }

    /// Set vertical scaling targets.
    pub fn with_resources(mut self, cpu: f64, memory_gb: f64) -> Self {
        self.parameters.target_cpu = Some(cpu);
        self.parameters.target_memory_gb = Some(memory_gb);
        self
    }

    /// Set a new timeout value.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.parameters.new_timeout_ms = Some(timeout_ms);
        self
    }
}

/// A complete remediation strategy: an ordered action sequence applicable
/// to a set of incident types. Catalog entries are read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationStrategy {
    /// Strategy name, unique within the catalog.
    pub name: String,
    /// What the strategy does.
    pub description: String,
    /// Incident types this strategy addresses.
    pub applicable_incident_types: Vec<IncidentType>,
    /// Ordered list of actions, dispatched one at a time.
    pub actions: Vec<RemediationAction>,
    /// Rough recovery time estimate in seconds.
    pub estimated_recovery_time_seconds: f64,
    /// Rough infrastructure cost estimate.
    pub estimated_cost: f64,
}

impl RemediationStrategy {
    /// Whether this strategy applies to the given incident type.
    pub fn applies_to(&self, incident_type: IncidentType) -> bool {
        self.applicable_incident_types.contains(&incident_type)
    }
}

/// Aggregated performance statistics for one (incident type, strategy) pair.
///
/// Mutated exactly once per cycle by the experience store, atomically with
/// the experience append. Invariant: `total_uses == successes + failures`,
/// and `average_reward` is the running mean of every final reward recorded
/// for the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub incident_type: IncidentType,
    pub strategy: String,
    pub total_uses: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_reward: f64,
    pub average_reward: f64,
    pub best_reward: f64,
    pub worst_reward: f64,
    pub last_used: DateTime<Utc>,
}

impl StrategyRecord {
    /// Fresh record with zero uses.
    pub fn new(incident_type: IncidentType, strategy: impl Into<String>) -> Self {
        Self {
            incident_type,
            strategy: strategy.into(),
            total_uses: 0,
            successes: 0,
            failures: 0,
            total_reward: 0.0,
            average_reward: 0.0,
            best_reward: f64::NEG_INFINITY,
            worst_reward: f64::INFINITY,
            last_used: Utc::now(),
        }
    }

    /// Fold one cycle outcome into the aggregate.
    pub fn record_outcome(&mut self, reward: f64, success: bool, at: DateTime<Utc>) {
        self.total_uses += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_reward += reward;
        self.average_reward = self.total_reward / self.total_uses as f64;
        self.best_reward = self.best_reward.max(reward);
        self.worst_reward = self.worst_reward.min(reward);
        self.last_used = at;
    }

    /// Fraction of uses that restored the service.
    pub fn success_rate(&self) -> f64 {
        if self.total_uses == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_uses as f64
        }
    }
}
