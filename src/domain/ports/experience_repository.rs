use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::models::{Experience, IncidentType, StrategyRecord};

/// Aggregate statistics over every experience in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total_experiences: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub average_reward: f64,
    pub best_reward: f64,
    pub average_recovery_time: f64,
    /// Mean reward of the second half of the session minus the first half.
    /// Positive means the policy is improving.
    pub improvement_trend: f64,
}

/// Durable store of experiences and per-(incident type, strategy)
/// aggregates.
///
/// `append` is the single mutation point: it persists the raw experience
/// and folds the outcome into the matching [`StrategyRecord`] in one
/// transaction, so no reader ever observes a record mid-update.
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    /// Commit one completed cycle. All-or-nothing.
    async fn append(&self, experience: &Experience) -> Result<()>;

    /// Aggregate record for one (incident type, strategy) pair, if any
    /// cycle has used it.
    async fn record_for(
        &self,
        incident_type: IncidentType,
        strategy: &str,
    ) -> Result<Option<StrategyRecord>>;

    /// All records for one incident type.
    async fn records_for(&self, incident_type: IncidentType) -> Result<Vec<StrategyRecord>>;

    /// Name of the strategy with the highest average reward among those
    /// actually used for the incident type, or `None` when nothing has
    /// been tried yet.
    async fn best_strategy_for(&self, incident_type: IncidentType) -> Result<Option<String>>;

    /// Most recent experiences, optionally filtered by incident type.
    async fn recent(
        &self,
        incident_type: Option<IncidentType>,
        limit: u32,
    ) -> Result<Vec<Experience>>;

    /// Every record, best average reward first.
    async fn rankings(&self) -> Result<Vec<StrategyRecord>>;

    /// Number of stored experiences.
    async fn count(&self) -> Result<u64>;

    /// Session-level aggregate statistics.
    async fn summary(&self) -> Result<StoreSummary>;
}
