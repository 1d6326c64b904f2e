//! Domain errors for the Mender learning loop.

use thiserror::Error;

use crate::domain::models::{IncidentType, LoopState};

/// Errors that can stop a learning cycle.
///
/// Guardrail blocks and oracle failures are deliberately absent: both are
/// expected in-cycle conditions, absorbed into the audit trail and the
/// reward computation rather than surfaced as errors.
#[derive(Debug, Error)]
pub enum MenderError {
    /// The incident source could not produce an incident. Fatal: generation
    /// is a collaborator call assumed reliable, so a failure indicates a
    /// configuration fault, not a transient one.
    #[error("incident generation failed: {0}")]
    Generation(String),

    /// The catalog holds no strategy for the incident type. Fatal: this is
    /// a catalog misconfiguration, not a retryable condition.
    #[error("no applicable strategy for incident type: {0}")]
    NoApplicableStrategy(IncidentType),

    /// An action dispatch failed at the executor.
    #[error("action dispatch failed: {0}")]
    Execution(String),

    /// The experience append did not commit. Fatal for the cycle: the cycle
    /// must not count as learned if the store was left untouched.
    #[error("failed to persist experience: {0}")]
    Persistence(String),

    /// The state machine was asked to make an illegal move.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: LoopState, to: LoopState },

    /// A state handler ran without the cycle data its predecessor should
    /// have produced. Indicates a loop bug, not an operational fault.
    #[error("cycle state missing: {0}")]
    MissingCycleState(&'static str),
}

pub type MenderResult<T> = Result<T, MenderError>;
