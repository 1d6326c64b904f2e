//! Learning-loop state machine types.
//!
//! ```text
//! Idle -> DetectingIncident -> PlanningRemediation -> ExecutingRemediation
//!      -> EvaluatingOutcome -> Learning -> Idle | Completed
//! ```
//!
//! Any state may transition to `Failed` on an unrecoverable error.
//! `Completed` and `Failed` are terminal.

use serde::{Deserialize, Serialize};

use super::guardrail::GuardrailDecision;
use super::incident::{Incident, SystemMetrics};
use super::strategy::{RemediationAction, RemediationStrategy};

/// States of one learning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    DetectingIncident,
    PlanningRemediation,
    ExecutingRemediation,
    EvaluatingOutcome,
    Learning,
    Completed,
    Failed,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DetectingIncident => "detecting_incident",
            Self::PlanningRemediation => "planning_remediation",
            Self::ExecutingRemediation => "executing_remediation",
            Self::EvaluatingOutcome => "evaluating_outcome",
            Self::Learning => "learning",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the loop has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// States reachable from this one.
    pub fn valid_transitions(&self) -> Vec<LoopState> {
        match self {
            Self::Idle => vec![Self::DetectingIncident, Self::Completed, Self::Failed],
            Self::DetectingIncident => vec![Self::PlanningRemediation, Self::Failed],
            Self::PlanningRemediation => vec![Self::ExecutingRemediation, Self::Failed],
            Self::ExecutingRemediation => vec![Self::EvaluatingOutcome, Self::Failed],
            Self::EvaluatingOutcome => vec![Self::Learning, Self::Failed],
            Self::Learning => vec![Self::Idle, Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, next: LoopState) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action that passed the guardrails and was dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedAction {
    pub action: RemediationAction,
    /// Verdict that let it through (allow or warn).
    pub decision: GuardrailDecision,
    /// Whether the simulated dispatch took effect.
    pub succeeded: bool,
    pub cost: f64,
    pub recovery_time_seconds: f64,
}

/// An action the guardrails blocked; never dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedAction {
    pub action: RemediationAction,
    pub decision: GuardrailDecision,
}

/// Transient working state for one in-flight cycle.
///
/// Everything here is reset at the start of each cycle; the cycle counter
/// and epsilon live on the session, not here.
#[derive(Debug, Clone, Default)]
pub struct CycleData {
    pub incident: Option<Incident>,
    pub strategy: Option<RemediationStrategy>,
    pub explored: bool,
    /// Epsilon value the planning step decided under.
    pub epsilon_used: f64,
    pub executed: Vec<ExecutedAction>,
    pub skipped: Vec<SkippedAction>,
    pub metrics_after: Option<SystemMetrics>,
    pub recovery_time_seconds: f64,
    pub total_cost: f64,
    pub numeric_reward: f64,
    pub judged_adjustment: f64,
    pub final_reward: f64,
    pub service_restored: bool,
}

impl CycleData {
    /// Clear per-cycle state for a fresh incident.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Tools of dispatched actions, in order.
    pub fn executed_tools(&self) -> Vec<String> {
        self.executed
            .iter()
            .map(|e| e.action.action.as_str().to_string())
            .collect()
    }

    /// Tools of blocked actions, in order.
    pub fn skipped_tools(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| s.action.action.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_valid() {
        let path = [
            LoopState::Idle,
            LoopState::DetectingIncident,
            LoopState::PlanningRemediation,
            LoopState::ExecutingRemediation,
            LoopState::EvaluatingOutcome,
            LoopState::Learning,
            LoopState::Idle,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be valid",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn every_live_state_can_fail() {
        for state in [
            LoopState::Idle,
            LoopState::DetectingIncident,
            LoopState::PlanningRemediation,
            LoopState::ExecutingRemediation,
            LoopState::EvaluatingOutcome,
            LoopState::Learning,
        ] {
            assert!(state.can_transition_to(LoopState::Failed));
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(LoopState::Completed.valid_transitions().is_empty());
        assert!(LoopState::Failed.valid_transitions().is_empty());
        assert!(LoopState::Completed.is_terminal());
        assert!(LoopState::Failed.is_terminal());
    }

    #[test]
    fn learning_cannot_skip_back_to_executing() {
        assert!(!LoopState::Learning.can_transition_to(LoopState::ExecutingRemediation));
        assert!(!LoopState::Idle.can_transition_to(LoopState::Learning));
    }

    #[test]
    fn reset_clears_cycle_state() {
        let mut data = CycleData {
            total_cost: 4.2,
            explored: true,
            ..CycleData::default()
        };
        data.reset();
        assert!(data.strategy.is_none());
        assert!(data.total_cost.abs() < f64::EPSILON);
        assert!(!data.explored);
    }
}
