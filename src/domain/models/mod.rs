pub mod config;
pub mod cycle;
pub mod experience;
pub mod guardrail;
pub mod incident;
pub mod strategy;

pub use config::{
    Config, DatabaseConfig, GuardrailConfig, LearningConfig, LoggingConfig, OracleConfig,
    RewardConfig,
};
pub use cycle::{CycleData, ExecutedAction, LoopState, SkippedAction};
pub use experience::Experience;
pub use guardrail::{GuardrailDecision, GuardrailVerdict};
pub use incident::{Incident, IncidentSeverity, IncidentType, SystemMetrics};
pub use strategy::{
    ActionParameters, RemediationAction, RemediationActionType, RemediationStrategy,
    StrategyRecord,
};
