//! Built-in remediation strategy catalog.
//!
//! Eighteen strategies, three per incident type. The catalog is
//! configuration, not learned state, and is read-only at runtime.

use crate::domain::models::{
    IncidentType, RemediationAction, RemediationActionType, RemediationStrategy,
};

/// Read-only collection of remediation strategies.
pub struct StrategyCatalog {
    strategies: Vec<RemediationStrategy>,
}

fn strategy(
    name: &str,
    description: &str,
    target: IncidentType,
    actions: Vec<RemediationAction>,
    est_recovery: f64,
    est_cost: f64,
) -> RemediationStrategy {
    RemediationStrategy {
        name: name.to_string(),
        description: description.to_string(),
        applicable_incident_types: vec![target],
        actions,
        estimated_recovery_time_seconds: est_recovery,
        estimated_cost: est_cost,
    }
}

impl StrategyCatalog {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        use IncidentType::{
            CpuSpike, HighLatency, MemoryLeak, NetworkDegradation, ServiceCrash,
            TimeoutMisconfiguration,
        };
        use RemediationActionType::{
            ChangeTimeout, ClearCache, RebalanceLoad, RestartService, RollbackDeployment,
            ScaleHorizontal, ScaleVertical,
        };

        let strategies = vec![
            // Service crash
            strategy(
                "restart_and_verify",
                "Restart the crashed service and verify recovery",
                ServiceCrash,
                vec![RemediationAction::new(RestartService, "Restart the crashed service")],
                30.0,
                0.1,
            ),
            strategy(
                "rollback_and_restart",
                "Rollback to previous deployment then restart",
                ServiceCrash,
                vec![
                    RemediationAction::new(
                        RollbackDeployment,
                        "Rollback to last known good deployment",
                    ),
                    RemediationAction::new(RestartService, "Restart service after rollback"),
                ],
                90.0,
                0.6,
            ),
            strategy(
                "scale_and_restart",
                "Scale up instances then restart the failed one",
                ServiceCrash,
                vec![
                    RemediationAction::new(ScaleHorizontal, "Add more instances for redundancy")
                        .with_target_instances(3),
                    RemediationAction::new(RestartService, "Restart the crashed instance"),
                ],
                60.0,
                2.1,
            ),
            // High latency
            strategy(
                "scale_out_for_latency",
                "Scale horizontally to distribute load and reduce latency",
                HighLatency,
                vec![
                    RemediationAction::new(ScaleHorizontal, "Scale out to 4 instances")
                        .with_target_instances(4),
                    RemediationAction::new(RebalanceLoad, "Rebalance traffic across instances"),
                ],
                45.0,
                2.3,
            ),
            strategy(
                "cache_and_rebalance",
                "Clear cache and rebalance load to reduce latency",
                HighLatency,
                vec![
                    RemediationAction::new(ClearCache, "Clear stale cache entries"),
                    RemediationAction::new(RebalanceLoad, "Rebalance traffic distribution"),
                ],
                30.0,
                0.4,
            ),
            strategy(
                "vertical_scale_for_latency",
                "Scale up instance resources to handle load",
                HighLatency,
                vec![
                    RemediationAction::new(ScaleVertical, "Increase CPU and memory")
                        .with_resources(4.0, 8.0),
                ],
                40.0,
                1.5,
            ),
            // CPU spike
            strategy(
                "vertical_scale_cpu",
                "Scale up CPU resources to handle spike",
                CpuSpike,
                vec![
                    RemediationAction::new(ScaleVertical, "Increase CPU allocation")
                        .with_resources(4.0, 4.0),
                ],
                35.0,
                1.5,
            ),
            strategy(
                "horizontal_scale_cpu",
                "Scale out to distribute CPU load",
                CpuSpike,
                vec![
                    RemediationAction::new(ScaleHorizontal, "Add instances to distribute load")
                        .with_target_instances(4),
                    RemediationAction::new(RebalanceLoad, "Rebalance traffic"),
                ],
                50.0,
                2.3,
            ),
            strategy(
                "restart_for_cpu",
                "Restart service to clear runaway processes",
                CpuSpike,
                vec![RemediationAction::new(RestartService, "Restart to clear runaway processes")],
                30.0,
                0.1,
            ),
            // Memory leak
            strategy(
                "restart_for_memory",
                "Restart service to reclaim leaked memory",
                MemoryLeak,
                vec![RemediationAction::new(RestartService, "Restart to reclaim leaked memory")],
                30.0,
                0.1,
            ),
            strategy(
                "rollback_memory_leak",
                "Rollback deployment that introduced the memory leak",
                MemoryLeak,
                vec![
                    RemediationAction::new(
                        RollbackDeployment,
                        "Rollback to version without memory leak",
                    ),
                    RemediationAction::new(RestartService, "Restart with rolled-back version"),
                ],
                90.0,
                0.6,
            ),
            strategy(
                "scale_and_cache_memory",
                "Scale up memory and clear cache to mitigate leak",
                MemoryLeak,
                vec![
                    RemediationAction::new(ScaleVertical, "Increase memory allocation")
                        .with_resources(2.0, 8.0),
                    RemediationAction::new(ClearCache, "Clear cache to free memory"),
                ],
                40.0,
                1.6,
            ),
            // Network degradation
            strategy(
                "rebalance_network",
                "Rebalance load to route around degraded network paths",
                NetworkDegradation,
                vec![RemediationAction::new(RebalanceLoad, "Rebalance to healthy network paths")],
                25.0,
                0.3,
            ),
            strategy(
                "scale_and_timeout_network",
                "Scale out and adjust timeouts for network issues",
                NetworkDegradation,
                vec![
                    RemediationAction::new(ScaleHorizontal, "Add instances in different zones")
                        .with_target_instances(3),
                    RemediationAction::new(ChangeTimeout, "Increase timeout for slow network")
                        .with_timeout_ms(10_000),
                ],
                50.0,
                2.05,
            ),
            strategy(
                "restart_and_rebalance_network",
                "Restart service and rebalance to recover from network issues",
                NetworkDegradation,
                vec![
                    RemediationAction::new(RestartService, "Restart to reset network connections"),
                    RemediationAction::new(RebalanceLoad, "Rebalance traffic"),
                ],
                40.0,
                0.4,
            ),
            // Timeout misconfiguration
            strategy(
                "fix_timeout",
                "Correct the timeout configuration",
                TimeoutMisconfiguration,
                vec![
                    RemediationAction::new(ChangeTimeout, "Set timeout to optimal value")
                        .with_timeout_ms(5000),
                ],
                10.0,
                0.05,
            ),
            strategy(
                "rollback_timeout",
                "Rollback the deployment that changed timeout settings",
                TimeoutMisconfiguration,
                vec![
                    RemediationAction::new(
                        RollbackDeployment,
                        "Rollback to previous timeout config",
                    ),
                ],
                60.0,
                0.5,
            ),
            strategy(
                "timeout_and_restart",
                "Fix timeout and restart to apply changes",
                TimeoutMisconfiguration,
                vec![
                    RemediationAction::new(ChangeTimeout, "Correct timeout value")
                        .with_timeout_ms(5000),
                    RemediationAction::new(RestartService, "Restart to apply new timeout"),
                    RemediationAction::new(RebalanceLoad, "Rebalance after restart"),
                ],
                40.0,
                0.45,
            ),
        ];

        Self { strategies }
    }

    /// Build a catalog from an explicit strategy list.
    pub fn from_strategies(strategies: Vec<RemediationStrategy>) -> Self {
        Self { strategies }
    }

    /// All strategies, in catalog order.
    pub fn all(&self) -> &[RemediationStrategy] {
        &self.strategies
    }

    /// Strategies applicable to the given incident type, in catalog order.
    pub fn applicable_to(&self, incident_type: IncidentType) -> Vec<&RemediationStrategy> {
        self.strategies
            .iter()
            .filter(|s| s.applies_to(incident_type))
            .collect()
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Option<&RemediationStrategy> {
        self.strategies.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_eighteen_strategies() {
        assert_eq!(StrategyCatalog::builtin().len(), 18);
    }

    #[test]
    fn every_incident_type_has_three_strategies() {
        let catalog = StrategyCatalog::builtin();
        for ty in IncidentType::ALL {
            assert_eq!(catalog.applicable_to(ty).len(), 3, "{ty} should have 3 strategies");
        }
    }

    #[test]
    fn names_are_unique() {
        let catalog = StrategyCatalog::builtin();
        let names: HashSet<_> = catalog.all().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn every_strategy_has_actions() {
        for s in StrategyCatalog::builtin().all() {
            assert!(!s.actions.is_empty(), "{} has no actions", s.name);
            assert!(s.estimated_recovery_time_seconds > 0.0);
        }
    }

    #[test]
    fn lookup_by_name() {
        let catalog = StrategyCatalog::builtin();
        let found = catalog.get("cache_and_rebalance").expect("known strategy");
        assert_eq!(found.actions.len(), 2);
        assert!(catalog.get("does_not_exist").is_none());
    }
}
