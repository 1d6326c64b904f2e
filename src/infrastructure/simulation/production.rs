//! Simulated production system.
//!
//! Generates incidents that degrade a metrics model and responds to
//! remediation actions by interpolating back toward a healthy baseline.
//! How well an action works depends on the incident type, so different
//! strategies genuinely earn different rewards and the bandit has
//! something to learn.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::{
    Incident, IncidentSeverity, IncidentType, RemediationAction, RemediationActionType,
    SystemMetrics,
};
use crate::domain::ports::{ActionExecutor, ActionOutcome, IncidentSource};

/// Metric ranges and severity weights for one incident type.
struct IncidentProfile {
    latency_ms: (f64, f64),
    cpu_percent: (f64, f64),
    memory_percent: (f64, f64),
    error_rate: (f64, f64),
    availability: (f64, f64),
    requests_per_second: (f64, f64),
    description: &'static str,
    severity_weights: &'static [(IncidentSeverity, f64)],
}

fn profile(incident_type: IncidentType) -> IncidentProfile {
    use IncidentSeverity::{Critical, High, Low, Medium};
    match incident_type {
        IncidentType::ServiceCrash => IncidentProfile {
            latency_ms: (5000.0, 30000.0),
            cpu_percent: (10.0, 30.0),
            memory_percent: (10.0, 30.0),
            error_rate: (0.8, 1.0),
            availability: (0.0, 0.2),
            requests_per_second: (0.0, 10.0),
            description: "Service has crashed and is not responding to requests",
            severity_weights: &[(Critical, 0.6), (High, 0.3), (Medium, 0.1)],
        },
        IncidentType::HighLatency => IncidentProfile {
            latency_ms: (2000.0, 10000.0),
            cpu_percent: (60.0, 85.0),
            memory_percent: (50.0, 70.0),
            error_rate: (0.05, 0.3),
            availability: (0.7, 0.95),
            requests_per_second: (30.0, 60.0),
            description: "Service experiencing abnormally high latency",
            severity_weights: &[(High, 0.4), (Medium, 0.5), (Low, 0.1)],
        },
        IncidentType::CpuSpike => IncidentProfile {
            latency_ms: (500.0, 3000.0),
            cpu_percent: (90.0, 100.0),
            memory_percent: (50.0, 70.0),
            error_rate: (0.02, 0.15),
            availability: (0.8, 0.95),
            requests_per_second: (40.0, 70.0),
            description: "CPU utilization has spiked to dangerous levels",
            severity_weights: &[(High, 0.5), (Medium, 0.4), (Low, 0.1)],
        },
        IncidentType::MemoryLeak => IncidentProfile {
            latency_ms: (300.0, 2000.0),
            cpu_percent: (40.0, 60.0),
            memory_percent: (85.0, 99.0),
            error_rate: (0.03, 0.2),
            availability: (0.75, 0.95),
            requests_per_second: (50.0, 80.0),
            description: "Memory usage is continuously increasing indicating a memory leak",
            severity_weights: &[(High, 0.4), (Medium, 0.5), (Low, 0.1)],
        },
        IncidentType::NetworkDegradation => IncidentProfile {
            latency_ms: (1000.0, 8000.0),
            cpu_percent: (30.0, 50.0),
            memory_percent: (40.0, 60.0),
            error_rate: (0.1, 0.4),
            availability: (0.6, 0.85),
            requests_per_second: (20.0, 50.0),
            description: "Network connectivity is degraded causing packet loss and timeouts",
            severity_weights: &[(High, 0.3), (Medium, 0.5), (Low, 0.2)],
        },
        IncidentType::TimeoutMisconfiguration => IncidentProfile {
            latency_ms: (3000.0, 15000.0),
            cpu_percent: (30.0, 50.0),
            memory_percent: (40.0, 55.0),
            error_rate: (0.2, 0.6),
            availability: (0.5, 0.8),
            requests_per_second: (20.0, 40.0),
            description: "Timeout settings are misconfigured causing cascading failures",
            severity_weights: &[(Medium, 0.6), (High, 0.3), (Low, 0.1)],
        },
    }
}

/// How well each action works for each incident type:
/// (success probability, recovery factor).
fn effectiveness(
    incident_type: IncidentType,
    action: RemediationActionType,
) -> (f64, f64) {
    use RemediationActionType::{
        ChangeTimeout, ClearCache, RebalanceLoad, RestartService, RollbackDeployment,
        ScaleHorizontal, ScaleVertical,
    };
    match incident_type {
        IncidentType::ServiceCrash => match action {
            RestartService => (0.85, 0.9),
            RollbackDeployment => (0.75, 0.85),
            ScaleHorizontal => (0.4, 0.5),
            ScaleVertical => (0.3, 0.4),
            ClearCache => (0.2, 0.3),
            RebalanceLoad => (0.3, 0.4),
            ChangeTimeout => (0.1, 0.1),
        },
        IncidentType::HighLatency => match action {
            ScaleHorizontal => (0.8, 0.85),
            ClearCache => (0.7, 0.75),
            RebalanceLoad => (0.75, 0.8),
            ScaleVertical => (0.65, 0.7),
            RestartService => (0.5, 0.6),
            ChangeTimeout => (0.4, 0.5),
            RollbackDeployment => (0.3, 0.4),
        },
        IncidentType::CpuSpike => match action {
            ScaleVertical => (0.85, 0.9),
            ScaleHorizontal => (0.8, 0.85),
            RestartService => (0.6, 0.65),
            RebalanceLoad => (0.55, 0.6),
            RollbackDeployment => (0.4, 0.5),
            ClearCache => (0.3, 0.35),
            ChangeTimeout => (0.1, 0.15),
        },
        IncidentType::MemoryLeak => match action {
            RestartService => (0.9, 0.95),
            RollbackDeployment => (0.7, 0.8),
            ScaleVertical => (0.6, 0.65),
            ClearCache => (0.5, 0.55),
            ScaleHorizontal => (0.4, 0.45),
            RebalanceLoad => (0.2, 0.25),
            ChangeTimeout => (0.05, 0.1),
        },
        IncidentType::NetworkDegradation => match action {
            RebalanceLoad => (0.8, 0.85),
            ScaleHorizontal => (0.6, 0.65),
            ChangeTimeout => (0.55, 0.6),
            RestartService => (0.4, 0.45),
            ClearCache => (0.3, 0.35),
            RollbackDeployment => (0.25, 0.3),
            ScaleVertical => (0.2, 0.25),
        },
        IncidentType::TimeoutMisconfiguration => match action {
            ChangeTimeout => (0.9, 0.95),
            RollbackDeployment => (0.7, 0.75),
            RestartService => (0.5, 0.55),
            RebalanceLoad => (0.4, 0.45),
            ScaleHorizontal => (0.3, 0.35),
            ClearCache => (0.2, 0.25),
            ScaleVertical => (0.15, 0.2),
        },
    }
}

struct SimState {
    metrics: SystemMetrics,
    incident: Option<Incident>,
    rng: StdRng,
}

/// Simulated production system implementing the incident-source and
/// action-executor ports.
pub struct SimulatedProduction {
    state: Mutex<SimState>,
    /// When set, every generated incident has this type.
    forced_type: Option<IncidentType>,
}

impl SimulatedProduction {
    /// Create a healthy system. Pass a seed for reproducible sessions.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(SimState {
                metrics: SystemMetrics::healthy(),
                incident: None,
                rng,
            }),
            forced_type: None,
        }
    }

    /// Restrict generation to a single incident type.
    pub fn with_incident_type(mut self, incident_type: IncidentType) -> Self {
        self.forced_type = Some(incident_type);
        self
    }

    fn pick_severity(
        rng: &mut StdRng,
        weights: &[(IncidentSeverity, f64)],
    ) -> IncidentSeverity {
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut roll = rng.gen_range(0.0..total);
        for (severity, weight) in weights {
            if roll < *weight {
                return *severity;
            }
            roll -= weight;
        }
        weights.last().map_or(IncidentSeverity::Medium, |(s, _)| *s)
    }

    /// Interpolate every metric toward the healthy baseline.
    fn apply_recovery(metrics: &mut SystemMetrics, factor: f64) {
        let healthy = SystemMetrics::healthy();
        metrics.latency_ms += (healthy.latency_ms - metrics.latency_ms) * factor;
        metrics.cpu_percent += (healthy.cpu_percent - metrics.cpu_percent) * factor;
        metrics.memory_percent += (healthy.memory_percent - metrics.memory_percent) * factor;
        metrics.error_rate =
            (metrics.error_rate + (healthy.error_rate - metrics.error_rate) * factor)
                .clamp(0.0, 1.0);
        metrics.availability =
            (metrics.availability + (healthy.availability - metrics.availability) * factor)
                .clamp(0.0, 1.0);
        metrics.requests_per_second +=
            (healthy.requests_per_second - metrics.requests_per_second) * factor;
    }
}

#[async_trait]
impl IncidentSource for SimulatedProduction {
    async fn generate_incident(&self) -> Result<Incident> {
        let mut state = self.state.lock().await;

        let incident_type = match self.forced_type {
            Some(ty) => ty,
            None => {
                let index = state.rng.gen_range(0..IncidentType::ALL.len());
                IncidentType::ALL[index]
            }
        };
        let profile = profile(incident_type);
        let severity = Self::pick_severity(&mut state.rng, profile.severity_weights);

        let healthy = SystemMetrics::healthy();
        let lost_instances = state.rng.gen_range(0..=1);
        state.metrics = SystemMetrics {
            latency_ms: state.rng.gen_range(profile.latency_ms.0..profile.latency_ms.1),
            cpu_percent: state.rng.gen_range(profile.cpu_percent.0..profile.cpu_percent.1),
            memory_percent: state
                .rng
                .gen_range(profile.memory_percent.0..profile.memory_percent.1),
            error_rate: state.rng.gen_range(profile.error_rate.0..profile.error_rate.1),
            availability: state
                .rng
                .gen_range(profile.availability.0..profile.availability.1),
            active_instances: healthy.active_instances.saturating_sub(lost_instances).max(1),
            requests_per_second: state
                .rng
                .gen_range(profile.requests_per_second.0..profile.requests_per_second.1),
            timeout_ms: healthy.timeout_ms,
        };

        let id = Uuid::new_v4().simple().to_string();
        let incident = Incident {
            id: format!("INC-{}", id[..8].to_uppercase()),
            incident_type,
            severity,
            description: profile.description.to_string(),
            service_name: "production-service".to_string(),
            metrics_before: state.metrics.clone(),
            detected_at: Utc::now(),
        };

        state.incident = Some(incident.clone());
        Ok(incident)
    }

    async fn current_metrics(&self) -> Result<SystemMetrics> {
        let state = self.state.lock().await;
        Ok(state.metrics.clone())
    }
}

#[async_trait]
impl ActionExecutor for SimulatedProduction {
    async fn dispatch(&self, action: &RemediationAction) -> Result<ActionOutcome> {
        let mut state = self.state.lock().await;

        let incident_type = state
            .incident
            .as_ref()
            .map(|i| i.incident_type)
            .context("no active incident to remediate")?;

        let (base_success, base_factor) = effectiveness(incident_type, action.action);
        let jitter_success: f64 = state.rng.gen_range(-0.1..0.1);
        let jitter_factor: f64 = state.rng.gen_range(-0.1..0.1);
        let success_prob = (base_success + jitter_success).clamp(0.0, 1.0);
        let recovery_factor = (base_factor + jitter_factor).clamp(0.0, 1.0);

        let succeeded = state.rng.gen_range(0.0..1.0) < success_prob;

        let mut cost = action.action.base_cost();
        match action.action {
            RemediationActionType::ScaleHorizontal => {
                let target = f64::from(action.parameters.target_instances.unwrap_or(3));
                cost *= target / 2.0;
            }
            RemediationActionType::ScaleVertical => {
                let cpu = action.parameters.target_cpu.unwrap_or(2.0);
                let memory = action.parameters.target_memory_gb.unwrap_or(4.0);
                cost *= (cpu + memory) / 4.0;
            }
            _ => {}
        }

        let factor = if succeeded {
            recovery_factor
        } else {
            // A failed action still nudges the system, just not by much.
            recovery_factor * state.rng.gen_range(0.0..0.3)
        };
        Self::apply_recovery(&mut state.metrics, factor);

        match action.action {
            RemediationActionType::ScaleHorizontal => {
                let target = action.parameters.target_instances.unwrap_or(3);
                state.metrics.active_instances = state.metrics.active_instances.max(target);
            }
            RemediationActionType::ChangeTimeout => {
                state.metrics.timeout_ms = action.parameters.new_timeout_ms.unwrap_or(5000);
            }
            _ => {}
        }

        let recovery_time_seconds = match action.action {
            RemediationActionType::RestartService => state.rng.gen_range(10.0..45.0),
            RemediationActionType::RollbackDeployment => state.rng.gen_range(30.0..90.0),
            RemediationActionType::ScaleHorizontal => state.rng.gen_range(20.0..60.0),
            _ => state.rng.gen_range(5.0..30.0),
        };

        let message = if succeeded {
            format!("action {} executed successfully", action.action)
        } else {
            format!("action {} had limited effect", action.action)
        };

        Ok(ActionOutcome {
            succeeded,
            cost,
            recovery_time_seconds,
            metrics: state.metrics.clone(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_incident_matches_profile_ranges() {
        let sim = SimulatedProduction::new(Some(42));
        for _ in 0..20 {
            let incident = sim.generate_incident().await.unwrap();
            let p = profile(incident.incident_type);
            let m = &incident.metrics_before;
            assert!(m.latency_ms >= p.latency_ms.0 && m.latency_ms < p.latency_ms.1);
            assert!(m.error_rate >= p.error_rate.0 && m.error_rate < p.error_rate.1);
            assert!(m.availability >= p.availability.0 && m.availability < p.availability.1);
            assert!(m.active_instances >= 1);
            assert!(incident.id.starts_with("INC-"));
        }
    }

    #[tokio::test]
    async fn forced_incident_type_is_respected() {
        let sim = SimulatedProduction::new(Some(7)).with_incident_type(IncidentType::MemoryLeak);
        for _ in 0..5 {
            let incident = sim.generate_incident().await.unwrap();
            assert_eq!(incident.incident_type, IncidentType::MemoryLeak);
        }
    }

    #[tokio::test]
    async fn dispatch_without_incident_fails() {
        let sim = SimulatedProduction::new(Some(1));
        let action = RemediationAction::new(RemediationActionType::RestartService, "restart");
        assert!(sim.dispatch(&action).await.is_err());
    }

    #[tokio::test]
    async fn horizontal_scale_cost_scales_with_target() {
        let sim = SimulatedProduction::new(Some(3));
        sim.generate_incident().await.unwrap();
        let action = RemediationAction::new(RemediationActionType::ScaleHorizontal, "scale out")
            .with_target_instances(4);
        let outcome = sim.dispatch(&action).await.unwrap();
        // base 2.0 * (4 / 2) = 4.0, independent of the RNG
        assert!((outcome.cost - 4.0).abs() < 1e-9);
        assert!(outcome.metrics.active_instances >= 4);
    }

    #[tokio::test]
    async fn change_timeout_sets_timeout() {
        let sim =
            SimulatedProduction::new(Some(9)).with_incident_type(IncidentType::TimeoutMisconfiguration);
        sim.generate_incident().await.unwrap();
        let action = RemediationAction::new(RemediationActionType::ChangeTimeout, "fix timeout")
            .with_timeout_ms(8000);
        let outcome = sim.dispatch(&action).await.unwrap();
        assert_eq!(outcome.metrics.timeout_ms, 8000);
    }

    #[tokio::test]
    async fn recovery_moves_metrics_toward_healthy() {
        let sim = SimulatedProduction::new(Some(5)).with_incident_type(IncidentType::ServiceCrash);
        let incident = sim.generate_incident().await.unwrap();
        let before = incident.metrics_before.clone();

        // Restarts are highly effective against crashes; after a few of
        // them availability must have improved even with jitter.
        let action = RemediationAction::new(RemediationActionType::RestartService, "restart");
        for _ in 0..3 {
            sim.dispatch(&action).await.unwrap();
        }
        let after = sim.current_metrics().await.unwrap();
        assert!(after.availability > before.availability);
        assert!(after.latency_ms < before.latency_ms);
        assert!(after.error_rate <= 1.0 && after.availability <= 1.0);
    }

    #[tokio::test]
    async fn seeded_sessions_are_reproducible() {
        let a = SimulatedProduction::new(Some(123));
        let b = SimulatedProduction::new(Some(123));
        for _ in 0..5 {
            let ia = a.generate_incident().await.unwrap();
            let ib = b.generate_incident().await.unwrap();
            assert_eq!(ia.incident_type, ib.incident_type);
            assert_eq!(ia.severity, ib.severity);
            assert!((ia.metrics_before.latency_ms - ib.metrics_before.latency_ms).abs() < 1e-9);
        }
    }
}
