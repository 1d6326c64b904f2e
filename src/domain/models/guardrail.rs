//! Guardrail verdict types.
//!
//! Verdicts gate one proposed action each. They are never stored beyond
//! the cycle except in the audit trail.

use serde::{Deserialize, Serialize};

/// Outcome class of a guardrail check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailVerdict {
    /// Action may be dispatched.
    Allow,
    /// Action may be dispatched, but the concern is recorded.
    Warn,
    /// Action must not be dispatched.
    Block,
}

impl GuardrailVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Block => "block",
        }
    }
}

/// Full result of evaluating the guardrail rules for one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailDecision {
    pub verdict: GuardrailVerdict,
    /// Name of the rule that fired (or `all_checks_passed`).
    pub rule: String,
    /// Why the rule fired.
    pub reason: String,
    /// Suggested alternative, when the rule has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl GuardrailDecision {
    pub fn allow(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            verdict: GuardrailVerdict::Allow,
            rule: rule.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }

    pub fn warn(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            verdict: GuardrailVerdict::Warn,
            rule: rule.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }

    pub fn block(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            verdict: GuardrailVerdict::Block,
            rule: rule.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }

    /// Attach a suggested alternative.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == GuardrailVerdict::Block
    }

    pub fn is_warning(&self) -> bool {
        self.verdict == GuardrailVerdict::Warn
    }
}
