//! Mender - Self-Learning Incident Remediation Agent
//!
//! Mender runs a closed learning loop over synthetic production incidents:
//! it detects an incident, plans a remediation strategy with an
//! epsilon-greedy bandit, executes the strategy's actions behind safety
//! guardrails, scores the outcome, and commits the experience so future
//! planning improves.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business types, errors, and port traits
//! - **Service Layer** (`services`): The control loop, bandit, guardrails,
//!   reward model, catalog, and audit trail
//! - **Infrastructure Layer** (`infrastructure`): Adapters - `SQLite` store,
//!   HTTP oracle, simulated production system, configuration
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mender::domain::models::Config;
//! use mender::domain::ports::NullOracle;
//! use mender::infrastructure::{DatabaseConnection, ExperienceRepositoryImpl, SimulatedProduction};
//! use mender::services::LearningLoop;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let db = DatabaseConnection::open(".mender/mender.db", 5).await?;
//!     let store = Arc::new(ExperienceRepositoryImpl::new(db.pool().clone()));
//!     let sim = Arc::new(SimulatedProduction::new(Some(42)));
//!     let mut session =
//!         LearningLoop::new(&config, sim.clone(), sim, Arc::new(NullOracle), store);
//!     let summary = session.run().await?;
//!     println!("average reward: {:.2}", summary.store.average_reward);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{MenderError, MenderResult};
pub use domain::models::{
    Config, Experience, GuardrailVerdict, Incident, IncidentSeverity, IncidentType, LoopState,
    RemediationAction, RemediationActionType, RemediationStrategy, StrategyRecord, SystemMetrics,
};
pub use domain::ports::{
    ActionExecutor, ExperienceRepository, IncidentSource, JudgmentOracle, NullOracle,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{GuardrailEngine, LearningLoop, RewardModel, StrategyCatalog, StrategyManager};
