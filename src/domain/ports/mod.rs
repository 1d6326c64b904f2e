//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces the infrastructure adapters implement:
//! - `IncidentSource`: incident generation and metric snapshots
//! - `ActionExecutor`: remediation action dispatch
//! - `JudgmentOracle`: external qualitative judgment (advisory)
//! - `ExperienceRepository`: durable experience and strategy statistics
//!
//! These contracts keep the control loop independent of the simulator,
//! the HTTP oracle, and the database.

pub mod action_executor;
pub mod experience_repository;
pub mod incident_source;
pub mod null_oracle;
pub mod oracle;

pub use action_executor::{ActionExecutor, ActionOutcome};
pub use experience_repository::{ExperienceRepository, StoreSummary};
pub use incident_source::IncidentSource;
pub use null_oracle::NullOracle;
pub use oracle::{JudgeRequest, JudgmentOracle, ADJUSTMENT_BOUND};
