//! The learning control loop.
//!
//! Sequences one incident cycle at a time through an explicit finite-state
//! machine: detect an incident, plan a strategy, execute it under the
//! guardrails, score the outcome, and commit the experience. Cycles never
//! interleave, so the statistics used for cycle n+1's planning always
//! reflect the outcome of cycle n.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::MenderError;
use crate::domain::models::{
    Config, CycleData, Experience, ExecutedAction, IncidentSeverity, IncidentType, LoopState,
    SkippedAction,
};
use crate::domain::ports::{
    ActionExecutor, ExperienceRepository, IncidentSource, JudgeRequest, JudgmentOracle,
    StoreSummary, ADJUSTMENT_BOUND,
};
use crate::services::audit_trail::{AuditCategory, AuditTrail};
use crate::services::guardrails::{CycleCounters, GuardrailEngine};
use crate::services::reward::RewardModel;
use crate::services::strategy_catalog::StrategyCatalog;
use crate::services::strategy_manager::StrategyManager;

/// What one completed cycle looked like, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub cycle_index: u32,
    pub incident_id: String,
    pub incident_type: IncidentType,
    pub severity: IncidentSeverity,
    pub strategy: String,
    pub explored: bool,
    pub epsilon: f64,
    pub actions_executed: Vec<String>,
    pub actions_skipped: Vec<String>,
    pub recovery_time_seconds: f64,
    pub cost: f64,
    pub numeric_reward: f64,
    pub judged_adjustment: f64,
    pub final_reward: f64,
    pub service_restored: bool,
}

/// End-of-session report.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub cycles_completed: u32,
    pub final_epsilon: f64,
    pub state: LoopState,
    pub store: StoreSummary,
}

/// The learning loop state machine.
///
/// Session-scoped state (cycle counter, epsilon) lives here rather than in
/// any global, so concurrent sessions stay independently testable.
pub struct LearningLoop {
    source: Arc<dyn IncidentSource>,
    executor: Arc<dyn ActionExecutor>,
    oracle: Arc<dyn JudgmentOracle>,
    store: Arc<dyn ExperienceRepository>,
    strategies: StrategyManager,
    guardrails: GuardrailEngine,
    reward: RewardModel,
    audit: AuditTrail,
    state: LoopState,
    cycle: CycleData,
    counters: CycleCounters,
    cycle_count: u32,
    max_cycles: u32,
}

impl LearningLoop {
    pub fn new(
        config: &Config,
        source: Arc<dyn IncidentSource>,
        executor: Arc<dyn ActionExecutor>,
        oracle: Arc<dyn JudgmentOracle>,
        store: Arc<dyn ExperienceRepository>,
    ) -> Self {
        Self {
            source,
            executor,
            oracle,
            store,
            strategies: StrategyManager::new(StrategyCatalog::builtin(), &config.learning),
            guardrails: GuardrailEngine::new(config.guardrails.clone()),
            reward: RewardModel::new(config.reward.clone()),
            audit: AuditTrail::default(),
            state: LoopState::Idle,
            cycle: CycleData::default(),
            counters: CycleCounters::default(),
            cycle_count: 0,
            max_cycles: config.learning.max_cycles,
        }
    }

    /// Replace the built-in strategy catalog (custom deployments).
    pub fn with_catalog(mut self, catalog: StrategyCatalog, config: &Config) -> Self {
        self.strategies = StrategyManager::new(catalog, &config.learning);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.strategies.epsilon()
    }

    /// Cycles completed so far.
    pub fn cycles_completed(&self) -> u32 {
        self.cycle_count
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Drive the loop through one full cycle.
    ///
    /// Returns `Ok(None)` when the session has completed its cycle budget.
    /// On a fatal error the loop lands in `Failed` and the error is
    /// returned; nothing from the broken cycle reaches the store.
    pub async fn run_cycle(&mut self) -> Result<Option<CycleOutcome>, MenderError> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        let starting_count = self.cycle_count;
        while self.cycle_count == starting_count && !self.state.is_terminal() {
            if let Err(err) = self.step().await {
                warn!(error = %err, state = %self.state, "cycle failed");
                self.audit.record(
                    self.cycle_count,
                    AuditCategory::Transition,
                    format!("{} -> failed: {err}", self.state),
                );
                self.state = LoopState::Failed;
                return Err(err);
            }
        }

        if self.cycle_count == starting_count {
            // The Idle step found the budget exhausted and completed.
            return Ok(None);
        }
        Ok(self.outcome_of_current_cycle())
    }

    /// Run to completion and summarize the session.
    pub async fn run(&mut self) -> Result<SessionSummary, MenderError> {
        while self.run_cycle().await?.is_some() {}
        self.summary().await
    }

    /// Session summary from the store's aggregates.
    pub async fn summary(&self) -> Result<SessionSummary, MenderError> {
        let store = self
            .store
            .summary()
            .await
            .map_err(|e| MenderError::Persistence(e.to_string()))?;
        Ok(SessionSummary {
            cycles_completed: self.cycle_count,
            final_epsilon: self.strategies.epsilon(),
            state: self.state,
            store,
        })
    }

    /// Advance the machine by exactly one state.
    async fn step(&mut self) -> Result<(), MenderError> {
        match self.state {
            LoopState::Idle => {
                if self.cycle_count < self.max_cycles {
                    self.transition(LoopState::DetectingIncident)
                } else {
                    self.transition(LoopState::Completed)
                }
            }
            LoopState::DetectingIncident => self.detect().await,
            LoopState::PlanningRemediation => self.plan().await,
            LoopState::ExecutingRemediation => self.execute().await,
            LoopState::EvaluatingOutcome => self.evaluate().await,
            LoopState::Learning => self.learn().await,
            LoopState::Completed | LoopState::Failed => Ok(()),
        }
    }

    fn transition(&mut self, to: LoopState) -> Result<(), MenderError> {
        if !self.state.can_transition_to(to) {
            return Err(MenderError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = %self.state, to = %to, cycle = self.cycle_count, "state transition");
        self.audit.record(
            self.cycle_count,
            AuditCategory::Transition,
            format!("{} -> {}", self.state, to),
        );
        self.state = to;
        Ok(())
    }

    async fn detect(&mut self) -> Result<(), MenderError> {
        self.cycle.reset();
        self.counters = CycleCounters::default();

        let incident = self
            .source
            .generate_incident()
            .await
            .map_err(|e| MenderError::Generation(e.to_string()))?;

        info!(
            incident = %incident.id,
            incident_type = %incident.incident_type,
            severity = %incident.severity,
            availability = incident.metrics_before.availability,
            "incident detected"
        );
        self.audit.record(
            self.cycle_count,
            AuditCategory::Detection,
            format!(
                "{} ({}, {}) detected",
                incident.id, incident.incident_type, incident.severity
            ),
        );

        self.cycle.incident = Some(incident);
        self.transition(LoopState::PlanningRemediation)
    }

    async fn plan(&mut self) -> Result<(), MenderError> {
        let incident_type = self
            .cycle
            .incident
            .as_ref()
            .map(|i| i.incident_type)
            .ok_or(MenderError::MissingCycleState("incident"))?;

        let selection = self
            .strategies
            .select(incident_type, &*self.store)
            .await?;

        info!(
            strategy = %selection.strategy.name,
            explored = selection.explored,
            epsilon = selection.epsilon,
            "strategy selected"
        );
        self.audit.record(
            self.cycle_count,
            AuditCategory::Planning,
            format!(
                "selected {} ({}, epsilon {:.3})",
                selection.strategy.name,
                if selection.explored { "explore" } else { "exploit" },
                selection.epsilon
            ),
        );

        self.cycle.explored = selection.explored;
        self.cycle.epsilon_used = selection.epsilon;
        self.cycle.strategy = Some(selection.strategy);
        self.transition(LoopState::ExecutingRemediation)
    }

    /// Dispatch the strategy's actions one at a time, each behind a
    /// guardrail check. Blocked actions are skipped, not fatal: partial
    /// execution proceeds to evaluation with whatever state resulted.
    async fn execute(&mut self) -> Result<(), MenderError> {
        let strategy = self
            .cycle
            .strategy
            .clone()
            .ok_or(MenderError::MissingCycleState("strategy"))?;

        for action in strategy.actions {
            let metrics = self
                .source
                .current_metrics()
                .await
                .map_err(|e| MenderError::Generation(e.to_string()))?;

            let decision = self.guardrails.evaluate(&action, &metrics, &self.counters);
            self.audit.record(
                self.cycle_count,
                AuditCategory::Guardrail,
                format!("{}: {} ({})", action.action, decision.verdict.as_str(), decision.rule),
            );

            if decision.is_blocked() {
                warn!(
                    action = %action.action,
                    rule = %decision.rule,
                    reason = %decision.reason,
                    "action blocked by guardrail"
                );
                self.cycle.skipped.push(SkippedAction { action, decision });
                continue;
            }
            if decision.is_warning() {
                warn!(action = %action.action, reason = %decision.reason, "guardrail warning");
            }

            let outcome = self
                .executor
                .dispatch(&action)
                .await
                .map_err(|e| MenderError::Execution(e.to_string()))?;

            // Counters move before the next action is evaluated, so
            // within-cycle ceilings hold across the same strategy.
            self.counters.record(action.action, outcome.cost);
            self.cycle.total_cost += outcome.cost;
            self.cycle.recovery_time_seconds += outcome.recovery_time_seconds;

            debug!(
                action = %action.action,
                succeeded = outcome.succeeded,
                cost = outcome.cost,
                "action dispatched"
            );
            self.audit.record(
                self.cycle_count,
                AuditCategory::Execution,
                format!("{}: {}", action.action, outcome.message),
            );

            self.cycle.executed.push(ExecutedAction {
                action,
                decision,
                succeeded: outcome.succeeded,
                cost: outcome.cost,
                recovery_time_seconds: outcome.recovery_time_seconds,
            });
        }

        let after = self
            .source
            .current_metrics()
            .await
            .map_err(|e| MenderError::Generation(e.to_string()))?;
        self.cycle.metrics_after = Some(after);
        self.transition(LoopState::EvaluatingOutcome)
    }

    async fn evaluate(&mut self) -> Result<(), MenderError> {
        let incident = self
            .cycle
            .incident
            .as_ref()
            .ok_or(MenderError::MissingCycleState("incident"))?;
        let after = self
            .cycle
            .metrics_after
            .as_ref()
            .ok_or(MenderError::MissingCycleState("metrics_after"))?;

        let breakdown = self.reward.evaluate(
            &incident.metrics_before,
            after,
            self.cycle.recovery_time_seconds,
            self.cycle.total_cost,
        );

        let strategy_name = self
            .cycle
            .strategy
            .as_ref()
            .map_or("", |s| s.name.as_str());
        let request = JudgeRequest {
            incident,
            strategy_name,
            metrics_before: &incident.metrics_before,
            metrics_after: after,
            recovery_time_seconds: self.cycle.recovery_time_seconds,
            numeric_reward: breakdown.numeric_reward,
        };

        // The oracle is advisory: any failure collapses to a zero
        // adjustment and the cycle carries on.
        let adjustment = match self.oracle.judge(&request).await {
            Ok(score) => score.clamp(-ADJUSTMENT_BOUND, ADJUSTMENT_BOUND),
            Err(err) => {
                warn!(error = %err, "oracle unavailable; adjustment defaults to 0");
                self.audit.record(
                    self.cycle_count,
                    AuditCategory::Evaluation,
                    format!("oracle unavailable: {err}"),
                );
                0.0
            }
        };

        self.cycle.service_restored = breakdown.service_restored;
        self.cycle.numeric_reward = breakdown.numeric_reward;
        self.cycle.judged_adjustment = adjustment;
        self.cycle.final_reward = breakdown.numeric_reward + adjustment;

        info!(
            numeric_reward = breakdown.numeric_reward,
            adjustment,
            final_reward = self.cycle.final_reward,
            service_restored = breakdown.service_restored,
            "outcome evaluated"
        );
        self.audit.record(
            self.cycle_count,
            AuditCategory::Evaluation,
            format!(
                "reward {:.2} (numeric {:.2}, adjustment {:+.2})",
                self.cycle.final_reward, breakdown.numeric_reward, adjustment
            ),
        );

        self.transition(LoopState::Learning)
    }

    async fn learn(&mut self) -> Result<(), MenderError> {
        let incident = self
            .cycle
            .incident
            .as_ref()
            .ok_or(MenderError::MissingCycleState("incident"))?;
        let after = self
            .cycle
            .metrics_after
            .clone()
            .ok_or(MenderError::MissingCycleState("metrics_after"))?;
        let strategy_name = self
            .cycle
            .strategy
            .as_ref()
            .map(|s| s.name.clone())
            .ok_or(MenderError::MissingCycleState("strategy"))?;

        let experience = Experience {
            id: Uuid::new_v4(),
            incident_type: incident.incident_type,
            severity: incident.severity,
            metrics_before: incident.metrics_before.clone(),
            strategy_used: strategy_name,
            actions_executed: self.cycle.executed_tools(),
            actions_skipped: self.cycle.skipped_tools(),
            metrics_after: after,
            recovery_time_seconds: self.cycle.recovery_time_seconds,
            cost: self.cycle.total_cost,
            numeric_reward: self.cycle.numeric_reward,
            judged_adjustment: self.cycle.judged_adjustment,
            final_reward: self.cycle.final_reward,
            service_restored: self.cycle.service_restored,
            explored: self.cycle.explored,
            cycle_index: self.cycle_count,
            recorded_at: Utc::now(),
        };

        // Fatal on failure: the cycle must not count as learned if the
        // append did not commit.
        self.store
            .append(&experience)
            .await
            .map_err(|e| MenderError::Persistence(e.to_string()))?;

        self.audit.record(
            self.cycle_count,
            AuditCategory::Learning,
            experience.summary(),
        );

        self.strategies.decay_epsilon();
        self.cycle_count += 1;

        info!(
            cycle = self.cycle_count,
            max_cycles = self.max_cycles,
            epsilon = self.strategies.epsilon(),
            "cycle committed"
        );

        if self.cycle_count < self.max_cycles {
            self.transition(LoopState::Idle)
        } else {
            self.transition(LoopState::Completed)
        }
    }

    fn outcome_of_current_cycle(&self) -> Option<CycleOutcome> {
        let incident = self.cycle.incident.as_ref()?;
        Some(CycleOutcome {
            cycle_index: self.cycle_count.saturating_sub(1),
            incident_id: incident.id.clone(),
            incident_type: incident.incident_type,
            severity: incident.severity,
            strategy: self
                .cycle
                .strategy
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            explored: self.cycle.explored,
            epsilon: self.cycle.epsilon_used,
            actions_executed: self.cycle.executed_tools(),
            actions_skipped: self.cycle.skipped_tools(),
            recovery_time_seconds: self.cycle.recovery_time_seconds,
            cost: self.cycle.total_cost,
            numeric_reward: self.cycle.numeric_reward,
            judged_adjustment: self.cycle.judged_adjustment,
            final_reward: self.cycle.final_reward,
            service_restored: self.cycle.service_restored,
        })
    }
}
