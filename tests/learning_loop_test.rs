//! End-to-end tests for the learning loop against the simulated
//! production system.

mod common;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use common::temp_store;
use mender::domain::errors::MenderError;
use mender::domain::models::{
    Config, Experience, GuardrailConfig, IncidentType, LearningConfig, LoopState,
    RemediationAction, RemediationActionType, RemediationStrategy, StrategyRecord,
};
use mender::domain::ports::{
    ExperienceRepository, JudgeRequest, JudgmentOracle, NullOracle, StoreSummary,
};
use mender::infrastructure::simulation::SimulatedProduction;
use mender::services::control_loop::LearningLoop;
use mender::services::strategy_catalog::StrategyCatalog;

fn test_config(cycles: u32, seed: u64) -> Config {
    Config {
        learning: LearningConfig {
            max_cycles: cycles,
            seed: Some(seed),
            ..LearningConfig::default()
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn full_session_completes_and_learns() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(SimulatedProduction::new(Some(42)));
    let config = test_config(5, 42);

    let mut session = LearningLoop::new(
        &config,
        sim.clone(),
        sim,
        Arc::new(NullOracle),
        store.clone(),
    );

    let summary = session.run().await.expect("session runs to completion");

    assert_eq!(summary.state, LoopState::Completed);
    assert_eq!(summary.cycles_completed, 5);
    assert_eq!(summary.store.total_experiences, 5);
    assert_eq!(store.count().await.unwrap(), 5);

    // Epsilon decayed each cycle and stayed above the floor.
    let expected = (0.2f64 * 0.95f64.powi(5)).max(0.05);
    assert!((summary.final_epsilon - expected).abs() < 1e-9);

    // Every record upholds the uses invariant after the session.
    for record in store.rankings().await.unwrap() {
        assert_eq!(record.total_uses, record.successes + record.failures);
        assert!(record.total_uses > 0);
    }
}

#[tokio::test]
async fn run_cycle_streams_outcomes_then_signals_completion() {
    let (_dir, _conn, store) = temp_store().await;
    let sim = Arc::new(SimulatedProduction::new(Some(7)));
    let config = test_config(3, 7);

    let mut session =
        LearningLoop::new(&config, sim.clone(), sim, Arc::new(NullOracle), Arc::new(store));

    let mut seen = Vec::new();
    while let Some(outcome) = session.run_cycle().await.unwrap() {
        seen.push(outcome);
    }

    assert_eq!(seen.len(), 3);
    assert_eq!(session.state(), LoopState::Completed);
    // Cycle indices are sequential and epsilon never increases.
    for (i, outcome) in seen.iter().enumerate() {
        assert_eq!(outcome.cycle_index, i as u32);
    }
    for pair in seen.windows(2) {
        assert!(pair[1].epsilon <= pair[0].epsilon);
    }

    // Further calls keep reporting completion.
    assert!(session.run_cycle().await.unwrap().is_none());
}

#[tokio::test]
async fn blocked_actions_never_reach_the_executor() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(SimulatedProduction::new(Some(11)));
    // A zero action budget blocks every action of every strategy.
    let config = Config {
        guardrails: GuardrailConfig {
            max_total_actions: 0,
            ..GuardrailConfig::default()
        },
        ..test_config(3, 11)
    };

    let mut session =
        LearningLoop::new(&config, sim.clone(), sim, Arc::new(NullOracle), store.clone());
    let summary = session.run().await.unwrap();

    // Partial (here: empty) execution is not an error; the session ran its
    // full budget and each cycle still evaluated and learned.
    assert_eq!(summary.cycles_completed, 3);
    for exp in store.recent(None, 10).await.unwrap() {
        assert!(exp.actions_executed.is_empty(), "blocked actions must not dispatch");
        assert!(!exp.actions_skipped.is_empty());
        assert!(exp.cost.abs() < f64::EPSILON);
    }
}

#[tokio::test]
async fn restart_storm_is_capped_by_the_restart_ceiling() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(
        SimulatedProduction::new(Some(13)).with_incident_type(IncidentType::MemoryLeak),
    );
    // The simulator may drop to one instance; keep the min-instance rule
    // out of the way so the ceiling is what fires.
    let config = Config {
        guardrails: GuardrailConfig {
            min_instances: 1,
            ..GuardrailConfig::default()
        },
        ..test_config(1, 13)
    };

    let catalog = StrategyCatalog::from_strategies(vec![RemediationStrategy {
        name: "restart_storm".to_string(),
        description: "Restart four times in a row".to_string(),
        applicable_incident_types: vec![IncidentType::MemoryLeak],
        actions: vec![
            RemediationAction::new(RemediationActionType::RestartService, "restart 1"),
            RemediationAction::new(RemediationActionType::RestartService, "restart 2"),
            RemediationAction::new(RemediationActionType::RestartService, "restart 3"),
            RemediationAction::new(RemediationActionType::RestartService, "restart 4"),
        ],
        estimated_recovery_time_seconds: 120.0,
        estimated_cost: 0.4,
    }]);

    let mut session =
        LearningLoop::new(&config, sim.clone(), sim, Arc::new(NullOracle), store.clone())
            .with_catalog(catalog, &config);
    session.run().await.unwrap();

    let exp = store.recent(None, 1).await.unwrap().remove(0);
    assert_eq!(exp.strategy_used, "restart_storm");
    assert_eq!(
        exp.actions_executed,
        vec!["restart_service", "restart_service", "restart_service"],
        "exactly three restarts dispatch"
    );
    assert_eq!(exp.actions_skipped, vec!["restart_service"], "the fourth is blocked");
}

/// Oracle that always fails, standing in for a timeout.
struct UnavailableOracle;

#[async_trait]
impl JudgmentOracle for UnavailableOracle {
    async fn judge(&self, _request: &JudgeRequest<'_>) -> Result<f64> {
        bail!("judge endpoint timed out")
    }
}

#[tokio::test]
async fn oracle_failure_defaults_adjustment_to_zero() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(SimulatedProduction::new(Some(21)));
    let config = test_config(2, 21);

    let mut session = LearningLoop::new(
        &config,
        sim.clone(),
        sim,
        Arc::new(UnavailableOracle),
        store.clone(),
    );
    let summary = session.run().await.unwrap();

    // The oracle being down never fails a cycle.
    assert_eq!(summary.state, LoopState::Completed);
    assert_eq!(summary.cycles_completed, 2);
    for exp in store.recent(None, 10).await.unwrap() {
        assert!(exp.judged_adjustment.abs() < f64::EPSILON);
        assert!((exp.final_reward - exp.numeric_reward).abs() < f64::EPSILON);
    }
}

/// Oracle that always returns a score far outside the bound.
struct LoudOracle;

#[async_trait]
impl JudgmentOracle for LoudOracle {
    async fn judge(&self, _request: &JudgeRequest<'_>) -> Result<f64> {
        Ok(500.0)
    }
}

#[tokio::test]
async fn oracle_adjustment_is_clamped() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(SimulatedProduction::new(Some(23)));
    let config = test_config(1, 23);

    let mut session =
        LearningLoop::new(&config, sim.clone(), sim, Arc::new(LoudOracle), store.clone());
    session.run().await.unwrap();

    let exp = store.recent(None, 1).await.unwrap().remove(0);
    assert!((exp.judged_adjustment - 20.0).abs() < f64::EPSILON);
    assert!((exp.final_reward - (exp.numeric_reward + 20.0)).abs() < 1e-9);
}

/// Store whose append always fails; reads behave like an empty store.
struct BrokenStore;

#[async_trait]
impl ExperienceRepository for BrokenStore {
    async fn append(&self, _experience: &Experience) -> Result<()> {
        bail!("disk full")
    }

    async fn record_for(
        &self,
        _incident_type: IncidentType,
        _strategy: &str,
    ) -> Result<Option<StrategyRecord>> {
        Ok(None)
    }

    async fn records_for(&self, _incident_type: IncidentType) -> Result<Vec<StrategyRecord>> {
        Ok(vec![])
    }

    async fn best_strategy_for(&self, _incident_type: IncidentType) -> Result<Option<String>> {
        Ok(None)
    }

    async fn recent(
        &self,
        _incident_type: Option<IncidentType>,
        _limit: u32,
    ) -> Result<Vec<Experience>> {
        Ok(vec![])
    }

    async fn rankings(&self) -> Result<Vec<StrategyRecord>> {
        Ok(vec![])
    }

    async fn count(&self) -> Result<u64> {
        Ok(0)
    }

    async fn summary(&self) -> Result<StoreSummary> {
        Ok(StoreSummary::default())
    }
}

#[tokio::test]
async fn persistence_failure_is_fatal_for_the_cycle() {
    let sim = Arc::new(SimulatedProduction::new(Some(31)));
    let config = test_config(3, 31);

    let mut session = LearningLoop::new(
        &config,
        sim.clone(),
        sim,
        Arc::new(NullOracle),
        Arc::new(BrokenStore),
    );

    let err = session.run_cycle().await.expect_err("append failure must fail the cycle");
    assert!(matches!(err, MenderError::Persistence(_)));
    assert_eq!(session.state(), LoopState::Failed);
    assert_eq!(session.cycles_completed(), 0, "the cycle must not count as learned");
}

#[tokio::test]
async fn session_with_forced_incident_type_converges_on_it() {
    let (_dir, _conn, store) = temp_store().await;
    let store = Arc::new(store);
    let sim = Arc::new(
        SimulatedProduction::new(Some(37)).with_incident_type(IncidentType::HighLatency),
    );
    let config = test_config(4, 37);

    let mut session =
        LearningLoop::new(&config, sim.clone(), sim, Arc::new(NullOracle), store.clone());
    session.run().await.unwrap();

    let records = store.records_for(IncidentType::HighLatency).await.unwrap();
    let total: u64 = records.iter().map(|r| r.total_uses).sum();
    assert_eq!(total, 4, "every cycle learned under the forced incident type");
    for exp in store.recent(None, 10).await.unwrap() {
        assert_eq!(exp.incident_type, IncidentType::HighLatency);
    }
}
