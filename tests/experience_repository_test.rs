//! Integration tests for the SQLite experience repository.

mod common;

use common::{experience, temp_store};
use mender::domain::models::IncidentType;
use mender::domain::ports::ExperienceRepository;

#[tokio::test]
async fn append_then_record_for_reflects_one_use() {
    let (_dir, _conn, store) = temp_store().await;
    let ty = IncidentType::HighLatency;

    assert!(store.record_for(ty, "cache_and_rebalance").await.unwrap().is_none());

    store
        .append(&experience(ty, "cache_and_rebalance", 92.0, true, 0))
        .await
        .unwrap();

    let record = store
        .record_for(ty, "cache_and_rebalance")
        .await
        .unwrap()
        .expect("record exists after append");
    assert_eq!(record.total_uses, 1);
    assert_eq!(record.successes, 1);
    assert_eq!(record.failures, 0);
    assert!((record.average_reward - 92.0).abs() < 1e-9);
    assert!((record.best_reward - 92.0).abs() < 1e-9);
    assert!((record.worst_reward - 92.0).abs() < 1e-9);
}

#[tokio::test]
async fn average_reward_is_running_mean() {
    let (_dir, _conn, store) = temp_store().await;
    let ty = IncidentType::CpuSpike;
    let rewards = [40.0, -10.0, 85.5, 0.0];

    for (i, r) in rewards.iter().enumerate() {
        store
            .append(&experience(ty, "restart_for_cpu", *r, *r > 0.0, i as u32))
            .await
            .unwrap();
    }

    let record = store.record_for(ty, "restart_for_cpu").await.unwrap().unwrap();
    let expected = rewards.iter().sum::<f64>() / rewards.len() as f64;
    assert_eq!(record.total_uses, 4);
    assert_eq!(record.total_uses, record.successes + record.failures);
    assert!((record.average_reward - expected).abs() < 1e-9);
    assert!((record.best_reward - 85.5).abs() < 1e-9);
    assert!((record.worst_reward - -10.0).abs() < 1e-9);
}

#[tokio::test]
async fn uses_invariant_holds_after_every_append() {
    let (_dir, _conn, store) = temp_store().await;
    let ty = IncidentType::MemoryLeak;

    for i in 0..10u32 {
        let restored = i % 3 == 0;
        store
            .append(&experience(ty, "restart_for_memory", f64::from(i) * 7.0 - 20.0, restored, i))
            .await
            .unwrap();

        let record = store.record_for(ty, "restart_for_memory").await.unwrap().unwrap();
        assert_eq!(record.total_uses, record.successes + record.failures);
        assert_eq!(record.total_uses, u64::from(i) + 1);
    }
}

#[tokio::test]
async fn best_strategy_prefers_highest_average() {
    let (_dir, _conn, store) = temp_store().await;
    let ty = IncidentType::HighLatency;

    assert!(store.best_strategy_for(ty).await.unwrap().is_none());

    store.append(&experience(ty, "scale_out_for_latency", 40.0, true, 0)).await.unwrap();
    store.append(&experience(ty, "cache_and_rebalance", 90.0, true, 1)).await.unwrap();
    store.append(&experience(ty, "vertical_scale_for_latency", -5.0, false, 2)).await.unwrap();

    let best = store.best_strategy_for(ty).await.unwrap().unwrap();
    assert_eq!(best, "cache_and_rebalance");

    // Strategies for other incident types never leak into the answer.
    store.append(&experience(IncidentType::CpuSpike, "vertical_scale_cpu", 500.0, true, 3)).await.unwrap();
    let best = store.best_strategy_for(ty).await.unwrap().unwrap();
    assert_eq!(best, "cache_and_rebalance");
}

#[tokio::test]
async fn records_are_keyed_by_incident_type_and_strategy() {
    let (_dir, _conn, store) = temp_store().await;

    // Same strategy name used under two incident types stays two records.
    store.append(&experience(IncidentType::ServiceCrash, "restart_and_verify", 80.0, true, 0)).await.unwrap();
    store.append(&experience(IncidentType::MemoryLeak, "restart_and_verify", 20.0, true, 1)).await.unwrap();

    let crash = store
        .record_for(IncidentType::ServiceCrash, "restart_and_verify")
        .await
        .unwrap()
        .unwrap();
    let leak = store
        .record_for(IncidentType::MemoryLeak, "restart_and_verify")
        .await
        .unwrap()
        .unwrap();
    assert!((crash.average_reward - 80.0).abs() < 1e-9);
    assert!((leak.average_reward - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn recent_filters_and_limits() {
    let (_dir, _conn, store) = temp_store().await;

    for i in 0..6u32 {
        let ty = if i % 2 == 0 {
            IncidentType::HighLatency
        } else {
            IncidentType::CpuSpike
        };
        let strategy = if i % 2 == 0 { "cache_and_rebalance" } else { "restart_for_cpu" };
        store.append(&experience(ty, strategy, f64::from(i), true, i)).await.unwrap();
    }

    assert_eq!(store.count().await.unwrap(), 6);

    let all = store.recent(None, 4).await.unwrap();
    assert_eq!(all.len(), 4);
    // Most recent first.
    assert_eq!(all[0].cycle_index, 5);

    let latency_only = store.recent(Some(IncidentType::HighLatency), 10).await.unwrap();
    assert_eq!(latency_only.len(), 3);
    assert!(latency_only.iter().all(|e| e.incident_type == IncidentType::HighLatency));
}

#[tokio::test]
async fn experience_round_trips_through_storage() {
    let (_dir, _conn, store) = temp_store().await;
    let original = experience(IncidentType::NetworkDegradation, "rebalance_network", 55.25, true, 3);
    store.append(&original).await.unwrap();

    let loaded = store.recent(None, 1).await.unwrap().remove(0);
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.strategy_used, original.strategy_used);
    assert_eq!(loaded.actions_executed, original.actions_executed);
    assert_eq!(loaded.severity, original.severity);
    assert!((loaded.final_reward - original.final_reward).abs() < 1e-9);
    assert!((loaded.metrics_before.latency_ms - original.metrics_before.latency_ms).abs() < 1e-9);
    assert_eq!(loaded.explored, original.explored);
}

#[tokio::test]
async fn rankings_are_sorted_by_average_reward() {
    let (_dir, _conn, store) = temp_store().await;

    store.append(&experience(IncidentType::HighLatency, "cache_and_rebalance", 10.0, true, 0)).await.unwrap();
    store.append(&experience(IncidentType::CpuSpike, "vertical_scale_cpu", 95.0, true, 1)).await.unwrap();
    store.append(&experience(IncidentType::MemoryLeak, "restart_for_memory", 50.0, true, 2)).await.unwrap();

    let rankings = store.rankings().await.unwrap();
    assert_eq!(rankings.len(), 3);
    assert_eq!(rankings[0].strategy, "vertical_scale_cpu");
    assert!(rankings.windows(2).all(|w| w[0].average_reward >= w[1].average_reward));
}

#[tokio::test]
async fn summary_aggregates_and_trends() {
    let (_dir, _conn, store) = temp_store().await;

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_experiences, 0);

    // First half poor, second half strong: trend must be positive.
    let rewards = [-20.0, -10.0, 60.0, 80.0];
    for (i, r) in rewards.iter().enumerate() {
        store
            .append(&experience(IncidentType::HighLatency, "cache_and_rebalance", *r, *r > 0.0, i as u32))
            .await
            .unwrap();
    }

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_experiences, 4);
    assert_eq!(summary.successes, 2);
    assert_eq!(summary.failures, 2);
    assert!((summary.success_rate - 0.5).abs() < 1e-9);
    assert!((summary.average_reward - 27.5).abs() < 1e-9);
    assert!((summary.best_reward - 80.0).abs() < 1e-9);
    assert!((summary.improvement_trend - (70.0 - -15.0)).abs() < 1e-9);
}
