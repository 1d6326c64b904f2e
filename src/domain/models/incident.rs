//! Incident and system metrics domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classes of production incident the controller knows how to remediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    ServiceCrash,
    HighLatency,
    CpuSpike,
    MemoryLeak,
    NetworkDegradation,
    TimeoutMisconfiguration,
}

impl IncidentType {
    /// All incident types, in catalog order.
    pub const ALL: [IncidentType; 6] = [
        Self::ServiceCrash,
        Self::HighLatency,
        Self::CpuSpike,
        Self::MemoryLeak,
        Self::NetworkDegradation,
        Self::TimeoutMisconfiguration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceCrash => "service_crash",
            Self::HighLatency => "high_latency",
            Self::CpuSpike => "cpu_spike",
            Self::MemoryLeak => "memory_leak",
            Self::NetworkDegradation => "network_degradation",
            Self::TimeoutMisconfiguration => "timeout_misconfiguration",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "service_crash" => Some(Self::ServiceCrash),
            "high_latency" => Some(Self::HighLatency),
            "cpu_spike" => Some(Self::CpuSpike),
            "memory_leak" => Some(Self::MemoryLeak),
            "network_degradation" => Some(Self::NetworkDegradation),
            "timeout_misconfiguration" => Some(Self::TimeoutMisconfiguration),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity levels for incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of measurable service metrics.
///
/// Value object: never mutated in place by the control loop. A fresh
/// snapshot is taken before and after remediation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Request latency in milliseconds.
    pub latency_ms: f64,
    /// CPU utilization percentage.
    pub cpu_percent: f64,
    /// Memory utilization percentage.
    pub memory_percent: f64,
    /// Error rate in [0, 1].
    pub error_rate: f64,
    /// Service availability in [0, 1].
    pub availability: f64,
    /// Number of active service instances.
    pub active_instances: u32,
    /// Current request throughput.
    pub requests_per_second: f64,
    /// Current timeout configuration in milliseconds.
    pub timeout_ms: u32,
}

impl SystemMetrics {
    /// Baseline metrics of a healthy service.
    pub fn healthy() -> Self {
        Self {
            latency_ms: 50.0,
            cpu_percent: 30.0,
            memory_percent: 40.0,
            error_rate: 0.01,
            availability: 0.999,
            active_instances: 2,
            requests_per_second: 100.0,
            timeout_ms: 5000,
        }
    }

    /// Composite health score from 0.0 (worst) to 1.0 (best).
    ///
    /// Weighted blend of latency, resource pressure, error rate and
    /// availability. Used for reporting and the healthy-system guard.
    pub fn health_score(&self) -> f64 {
        let latency_score = (1.0 - self.latency_ms / 5000.0).max(0.0);
        let cpu_score = (1.0 - self.cpu_percent / 100.0).max(0.0);
        let memory_score = (1.0 - self.memory_percent / 100.0).max(0.0);
        let error_score = (1.0 - self.error_rate).max(0.0);

        latency_score * 0.25
            + cpu_score * 0.15
            + memory_score * 0.15
            + error_score * 0.25
            + self.availability * 0.20
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::healthy()
    }
}

/// A production incident, created by the incident source at cycle start.
///
/// Immutable once created and scoped to exactly one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier, e.g. `INC-1A2B3C4D`.
    pub id: String,
    /// Class of incident.
    pub incident_type: IncidentType,
    /// Severity of the incident.
    pub severity: IncidentSeverity,
    /// Human-readable description.
    pub description: String,
    /// Affected service.
    pub service_name: String,
    /// Metrics observed at detection time.
    pub metrics_before: SystemMetrics,
    /// Detection timestamp.
    pub detected_at: DateTime<Utc>,
}
