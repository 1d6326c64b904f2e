//! Strategy selection: contextual epsilon-greedy bandit with decay.
//!
//! Exploration picks uniformly among the applicable strategies;
//! exploitation picks the best proven average reward. Strategies that have
//! never been used for an incident type are invisible to exploitation, so
//! the policy never converges onto zero-sample statistics.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::errors::MenderError;
use crate::domain::models::{IncidentType, LearningConfig, RemediationStrategy, StrategyRecord};
use crate::domain::ports::ExperienceRepository;
use crate::services::strategy_catalog::StrategyCatalog;

/// One planning decision.
#[derive(Debug, Clone)]
pub struct StrategySelection {
    pub strategy: RemediationStrategy,
    /// True when the pick came from exploration (or from a degenerate
    /// exploit with no proven candidate).
    pub explored: bool,
    /// Epsilon in effect when the decision was made.
    pub epsilon: f64,
    /// Proven average reward of the pick, when it had a record.
    pub expected_reward: Option<f64>,
}

/// Owns the bandit policy and the session-scoped exploration rate.
///
/// Epsilon is session state: decayed once per completed cycle, floor-
/// bounded, never reset upward except by building a new manager.
pub struct StrategyManager {
    catalog: StrategyCatalog,
    epsilon: f64,
    epsilon_min: f64,
    epsilon_decay: f64,
    rng: StdRng,
}

impl StrategyManager {
    pub fn new(catalog: StrategyCatalog, config: &LearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            epsilon: config.epsilon_initial,
            epsilon_min: config.epsilon_min,
            epsilon_decay: config.epsilon_decay,
            rng,
        }
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn catalog(&self) -> &StrategyCatalog {
        &self.catalog
    }

    /// Decay epsilon after a completed cycle:
    /// `epsilon <- max(epsilon_min, epsilon * decay)`.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    /// Pick a strategy for the incident type using the store's aggregated
    /// statistics.
    pub async fn select(
        &mut self,
        incident_type: IncidentType,
        store: &dyn ExperienceRepository,
    ) -> Result<StrategySelection, MenderError> {
        let records = store
            .records_for(incident_type)
            .await
            .map_err(|e| MenderError::Persistence(e.to_string()))?;
        self.choose(incident_type, &records)
    }

    /// Core decision, factored out of the async path for direct testing.
    pub fn choose(
        &mut self,
        incident_type: IncidentType,
        records: &[StrategyRecord],
    ) -> Result<StrategySelection, MenderError> {
        let candidates = self.catalog.applicable_to(incident_type);
        if candidates.is_empty() {
            return Err(MenderError::NoApplicableStrategy(incident_type));
        }

        let by_name: HashMap<&str, &StrategyRecord> = records
            .iter()
            .map(|r| (r.strategy.as_str(), r))
            .collect();

        let roll: f64 = self.rng.gen_range(0.0..1.0);
        let epsilon = self.epsilon;

        if roll < epsilon {
            let pick = candidates[self.rng.gen_range(0..candidates.len())].clone();
            debug!(
                incident_type = %incident_type,
                strategy = %pick.name,
                epsilon,
                "exploring"
            );
            let expected = by_name
                .get(pick.name.as_str())
                .filter(|r| r.total_uses > 0)
                .map(|r| r.average_reward);
            return Ok(StrategySelection {
                strategy: pick,
                explored: true,
                epsilon,
                expected_reward: expected,
            });
        }

        // Exploit: only strategies with at least one recorded use qualify.
        // Ties go to the less-used strategy, then to the lexicographically
        // smaller name, for full determinism.
        let mut proven: Vec<(&RemediationStrategy, &StrategyRecord)> = candidates
            .iter()
            .filter_map(|s| {
                by_name
                    .get(s.name.as_str())
                    .filter(|r| r.total_uses > 0)
                    .map(|r| (*s, *r))
            })
            .collect();

        if proven.is_empty() {
            // Nothing proven yet: exploitation has no candidate set, so the
            // pick degenerates to a uniform draw tagged as exploration.
            let pick = candidates[self.rng.gen_range(0..candidates.len())].clone();
            debug!(
                incident_type = %incident_type,
                strategy = %pick.name,
                "no proven strategies; falling back to exploration"
            );
            return Ok(StrategySelection {
                strategy: pick,
                explored: true,
                epsilon,
                expected_reward: None,
            });
        }

        proven.sort_by(|a, b| {
            b.1.average_reward
                .partial_cmp(&a.1.average_reward)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.total_uses.cmp(&b.1.total_uses))
                .then_with(|| a.0.name.cmp(&b.0.name))
        });

        let (strategy, record) = proven[0];
        debug!(
            incident_type = %incident_type,
            strategy = %strategy.name,
            average_reward = record.average_reward,
            total_uses = record.total_uses,
            "exploiting"
        );
        Ok(StrategySelection {
            strategy: strategy.clone(),
            explored: false,
            epsilon,
            expected_reward: Some(record.average_reward),
        })
    }
}
