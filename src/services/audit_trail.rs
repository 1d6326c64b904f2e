//! Audit trail for per-cycle decisions.
//!
//! Records state transitions, guardrail verdicts, and reward outcomes with
//! enough context for post-hoc analysis. This is the only place guardrail
//! verdicts survive past the cycle that produced them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// State machine transitions.
    Transition,
    /// Incident detection.
    Detection,
    /// Strategy selection decisions.
    Planning,
    /// Guardrail verdicts.
    Guardrail,
    /// Action dispatches.
    Execution,
    /// Reward computation and oracle judgments.
    Evaluation,
    /// Experience commits and epsilon decay.
    Learning,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transition => "transition",
            Self::Detection => "detection",
            Self::Planning => "planning",
            Self::Guardrail => "guardrail",
            Self::Execution => "execution",
            Self::Evaluation => "evaluation",
            Self::Learning => "learning",
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    /// Cycle the event belongs to.
    pub cycle: u32,
    pub category: AuditCategory,
    pub message: String,
}

/// Bounded in-memory audit log.
///
/// The learning loop is strictly sequential, so plain ownership is enough;
/// no lock is needed around the buffer.
#[derive(Debug)]
pub struct AuditTrail {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
}

impl AuditTrail {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Append one event, evicting the oldest entry when full.
    pub fn record(&mut self, cycle: u32, category: AuditCategory, message: impl Into<String>) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(AuditEntry {
            at: Utc::now(),
            cycle,
            category,
            message: message.into(),
        });
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    /// Entries for one cycle, oldest first.
    pub fn entries_for_cycle(&self, cycle: u32) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.cycle == cycle).collect()
    }

    /// Entries in one category, oldest first.
    pub fn entries_in(&self, category: AuditCategory) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.category == category).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_filters_by_cycle() {
        let mut trail = AuditTrail::default();
        trail.record(0, AuditCategory::Detection, "incident raised");
        trail.record(0, AuditCategory::Guardrail, "restart blocked");
        trail.record(1, AuditCategory::Detection, "incident raised");

        assert_eq!(trail.len(), 3);
        assert_eq!(trail.entries_for_cycle(0).len(), 2);
        assert_eq!(trail.entries_in(AuditCategory::Guardrail).len(), 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut trail = AuditTrail::new(2);
        trail.record(0, AuditCategory::Planning, "first");
        trail.record(0, AuditCategory::Planning, "second");
        trail.record(0, AuditCategory::Planning, "third");

        assert_eq!(trail.len(), 2);
        let messages: Vec<_> = trail.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "third"]);
    }
}
