//! Safety guardrails for remediation actions.
//!
//! Guardrails keep the agent from taking actions that could worsen an
//! incident: restarting the last running instance, scaling past limits,
//! blowing the cost budget, or hammering the same action repeatedly.
//!
//! Rules are evaluated in a fixed priority order and the first rule that
//! fires decides the verdict. Severity is never aggregated across rules.

use crate::domain::models::{
    GuardrailConfig, GuardrailDecision, RemediationAction, RemediationActionType, SystemMetrics,
};

/// Per-incident counters the guardrails read and the loop updates.
///
/// Reset at the start of every cycle. Counters are bumped immediately on
/// each allow/warn dispatch, before the next action in the same strategy
/// is evaluated, so within-cycle ceilings hold across the actions of a
/// single strategy.
#[derive(Debug, Clone, Default)]
pub struct CycleCounters {
    pub restarts: u32,
    pub rollbacks: u32,
    pub total_actions: u32,
    pub cumulative_cost: f64,
}

impl CycleCounters {
    /// Record one dispatched action.
    pub fn record(&mut self, action: RemediationActionType, cost: f64) {
        match action {
            RemediationActionType::RestartService => self.restarts += 1,
            RemediationActionType::RollbackDeployment => self.rollbacks += 1,
            _ => {}
        }
        self.total_actions += 1;
        self.cumulative_cost += cost;
    }
}

/// Stateless policy evaluator over a proposed action.
pub struct GuardrailEngine {
    config: GuardrailConfig,
}

impl GuardrailEngine {
    pub fn new(config: GuardrailConfig) -> Self {
        Self { config }
    }

    /// Create an engine with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(GuardrailConfig::default())
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// Evaluate a proposed action against the rules, first match wins.
    ///
    /// `metrics` is the system snapshot at evaluation time; `counters`
    /// are the running per-incident totals.
    pub fn evaluate(
        &self,
        action: &RemediationAction,
        metrics: &SystemMetrics,
        counters: &CycleCounters,
    ) -> GuardrailDecision {
        if !self.config.enabled {
            return GuardrailDecision::allow("guardrails_disabled", "guardrails are disabled");
        }

        if let Some(decision) = self.check_action_budget(counters) {
            return decision;
        }
        if let Some(decision) = self.check_restart_ceiling(action, counters) {
            return decision;
        }
        if let Some(decision) = self.check_rollback_ceiling(action, counters) {
            return decision;
        }
        if let Some(decision) = self.check_min_instances(action, metrics) {
            return decision;
        }
        if let Some(decision) = self.check_horizontal_bound(action) {
            return decision;
        }
        if let Some(decision) = self.check_vertical_bound(action) {
            return decision;
        }
        if let Some(decision) = self.check_timeout_bound(action) {
            return decision;
        }
        if let Some(decision) = self.check_cost_budget(action, counters) {
            return decision;
        }
        if let Some(decision) = self.check_already_healthy(action, metrics) {
            return decision;
        }

        GuardrailDecision::allow("all_checks_passed", "all guardrail checks passed")
    }

    fn check_action_budget(&self, counters: &CycleCounters) -> Option<GuardrailDecision> {
        if counters.total_actions >= self.config.max_total_actions {
            return Some(
                GuardrailDecision::block(
                    "max_total_actions",
                    format!(
                        "maximum actions per incident reached: {} (limit {})",
                        counters.total_actions, self.config.max_total_actions
                    ),
                )
                .with_suggestion("escalate to a human operator"),
            );
        }
        None
    }

    fn check_restart_ceiling(
        &self,
        action: &RemediationAction,
        counters: &CycleCounters,
    ) -> Option<GuardrailDecision> {
        if action.action != RemediationActionType::RestartService {
            return None;
        }
        if counters.restarts >= self.config.max_restarts_per_incident {
            return Some(
                GuardrailDecision::block(
                    "max_restarts_exceeded",
                    format!(
                        "already restarted {} time(s) this incident (limit {}); repeated restarts indicate a deeper issue",
                        counters.restarts, self.config.max_restarts_per_incident
                    ),
                )
                .with_suggestion("try a different strategy: rollback, scale, or escalate"),
            );
        }
        None
    }

    fn check_rollback_ceiling(
        &self,
        action: &RemediationAction,
        counters: &CycleCounters,
    ) -> Option<GuardrailDecision> {
        if action.action != RemediationActionType::RollbackDeployment {
            return None;
        }
        if counters.rollbacks >= self.config.max_rollbacks_per_incident {
            return Some(
                GuardrailDecision::block(
                    "max_rollbacks_exceeded",
                    format!(
                        "already rolled back {} time(s) this incident (limit {}); multiple rollbacks risk data inconsistency",
                        counters.rollbacks, self.config.max_rollbacks_per_incident
                    ),
                )
                .with_suggestion("try restart, scaling, or escalate to a human operator"),
            );
        }
        None
    }

    fn check_min_instances(
        &self,
        action: &RemediationAction,
        metrics: &SystemMetrics,
    ) -> Option<GuardrailDecision> {
        let verb = match action.action {
            RemediationActionType::RestartService => "restart",
            RemediationActionType::RollbackDeployment => "rollback",
            _ => return None,
        };
        if metrics.active_instances < self.config.min_instances {
            return Some(
                GuardrailDecision::block(
                    "min_instances",
                    format!(
                        "cannot {verb}: only {} instance(s) running (minimum {}); proceeding would risk a full outage",
                        metrics.active_instances, self.config.min_instances
                    ),
                )
                .with_suggestion(format!(
                    "scale horizontally to at least {} instances first, then retry",
                    self.config.min_instances
                )),
            );
        }
        None
    }

    fn check_horizontal_bound(&self, action: &RemediationAction) -> Option<GuardrailDecision> {
        if action.action != RemediationActionType::ScaleHorizontal {
            return None;
        }
        let target = action.parameters.target_instances.unwrap_or(3);
        if target > self.config.max_horizontal_instances {
            return Some(
                GuardrailDecision::block(
                    "max_horizontal_instances",
                    format!(
                        "cannot scale to {target} instances: exceeds limit of {}",
                        self.config.max_horizontal_instances
                    ),
                )
                .with_suggestion(format!(
                    "scale to at most {} instances",
                    self.config.max_horizontal_instances
                )),
            );
        }
        None
    }

    fn check_vertical_bound(&self, action: &RemediationAction) -> Option<GuardrailDecision> {
        if action.action != RemediationActionType::ScaleVertical {
            return None;
        }
        let cpu = action.parameters.target_cpu.unwrap_or(2.0);
        let memory = action.parameters.target_memory_gb.unwrap_or(4.0);
        if cpu > self.config.max_vertical_cpu {
            return Some(
                GuardrailDecision::block(
                    "max_vertical_cpu",
                    format!(
                        "cannot allocate {cpu} CPU cores: exceeds cap of {}",
                        self.config.max_vertical_cpu
                    ),
                )
                .with_suggestion(format!("use at most {} cores", self.config.max_vertical_cpu)),
            );
        }
        if memory > self.config.max_vertical_memory_gb {
            return Some(
                GuardrailDecision::block(
                    "max_vertical_memory",
                    format!(
                        "cannot allocate {memory}GB memory: exceeds cap of {}GB",
                        self.config.max_vertical_memory_gb
                    ),
                )
                .with_suggestion(format!(
                    "use at most {}GB memory",
                    self.config.max_vertical_memory_gb
                )),
            );
        }
        None
    }

    fn check_timeout_bound(&self, action: &RemediationAction) -> Option<GuardrailDecision> {
        if action.action != RemediationActionType::ChangeTimeout {
            return None;
        }
        let timeout = action.parameters.new_timeout_ms.unwrap_or(5000);
        if timeout < self.config.min_timeout_ms {
            return Some(
                GuardrailDecision::block(
                    "min_timeout",
                    format!(
                        "cannot set timeout to {timeout}ms: below minimum of {}ms; too-low timeouts cascade failures",
                        self.config.min_timeout_ms
                    ),
                )
                .with_suggestion(format!(
                    "set timeout to at least {}ms",
                    self.config.min_timeout_ms
                )),
            );
        }
        if timeout > self.config.max_timeout_ms {
            return Some(
                GuardrailDecision::block(
                    "max_timeout",
                    format!(
                        "cannot set timeout to {timeout}ms: exceeds maximum of {}ms; excessive timeouts tie up resources",
                        self.config.max_timeout_ms
                    ),
                )
                .with_suggestion(format!(
                    "set timeout to at most {}ms",
                    self.config.max_timeout_ms
                )),
            );
        }
        None
    }

    fn check_cost_budget(
        &self,
        action: &RemediationAction,
        counters: &CycleCounters,
    ) -> Option<GuardrailDecision> {
        let estimated = action.action.base_cost();
        if counters.cumulative_cost + estimated > self.config.cost_budget {
            return Some(
                GuardrailDecision::block(
                    "cost_budget_exceeded",
                    format!(
                        "cost budget exceeded: ${:.2} spent, action adds ~${:.2} (budget ${:.2})",
                        counters.cumulative_cost, estimated, self.config.cost_budget
                    ),
                )
                .with_suggestion("escalate to a human operator for manual intervention"),
            );
        }
        None
    }

    fn check_already_healthy(
        &self,
        action: &RemediationAction,
        metrics: &SystemMetrics,
    ) -> Option<GuardrailDecision> {
        if metrics.availability >= self.config.healthy_threshold {
            return Some(
                GuardrailDecision::warn(
                    "system_already_healthy",
                    format!(
                        "availability is {:.3} (threshold {:.3}); '{}' may be unnecessary",
                        metrics.availability,
                        self.config.healthy_threshold,
                        action.action
                    ),
                )
                .with_suggestion("consider skipping this action; the system appears recovered"),
            );
        }
        None
    }
}
