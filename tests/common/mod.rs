//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use mender::domain::models::{Experience, IncidentSeverity, IncidentType, SystemMetrics};
use mender::infrastructure::database::{DatabaseConnection, ExperienceRepositoryImpl};

/// Open a fresh store backed by a temp-dir SQLite file.
///
/// The `TempDir` must stay alive for as long as the store is used.
pub async fn temp_store() -> (TempDir, DatabaseConnection, ExperienceRepositoryImpl) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("mender-test.db");
    let connection = DatabaseConnection::open(&path, 2)
        .await
        .expect("open test database");
    let store = ExperienceRepositoryImpl::new(connection.pool().clone());
    (dir, connection, store)
}

/// A degraded metrics snapshot.
pub fn degraded_metrics() -> SystemMetrics {
    SystemMetrics {
        latency_ms: 850.0,
        cpu_percent: 45.0,
        memory_percent: 60.0,
        error_rate: 0.15,
        availability: 0.85,
        ..SystemMetrics::healthy()
    }
}

/// A recovered metrics snapshot.
pub fn recovered_metrics() -> SystemMetrics {
    SystemMetrics {
        latency_ms: 120.0,
        cpu_percent: 35.0,
        memory_percent: 55.0,
        error_rate: 0.01,
        availability: 0.99,
        ..SystemMetrics::healthy()
    }
}

/// Build an experience for the given strategy with the given reward.
pub fn experience(
    incident_type: IncidentType,
    strategy: &str,
    final_reward: f64,
    service_restored: bool,
    cycle_index: u32,
) -> Experience {
    Experience {
        id: Uuid::new_v4(),
        incident_type,
        severity: IncidentSeverity::Medium,
        metrics_before: degraded_metrics(),
        strategy_used: strategy.to_string(),
        actions_executed: vec!["clear_cache".to_string(), "rebalance_load".to_string()],
        actions_skipped: vec![],
        metrics_after: recovered_metrics(),
        recovery_time_seconds: 28.5,
        cost: 0.4,
        numeric_reward: final_reward,
        judged_adjustment: 0.0,
        final_reward,
        service_restored,
        explored: false,
        cycle_index,
        recorded_at: Utc::now(),
    }
}
