//! Integration tests for the HTTP judgment oracle against a mock server.

mod common;

use chrono::Utc;

use common::{degraded_metrics, recovered_metrics};
use mender::domain::models::{Incident, IncidentSeverity, IncidentType, OracleConfig};
use mender::domain::ports::{JudgeRequest, JudgmentOracle};
use mender::infrastructure::oracle::HttpOracle;

fn oracle_config(base_url: String) -> OracleConfig {
    OracleConfig {
        enabled: true,
        base_url,
        api_key: Some("test-key".to_string()),
        model: "gpt-4o-mini".to_string(),
        timeout_secs: 5,
    }
}

fn incident() -> Incident {
    Incident {
        id: "INC-TEST0001".to_string(),
        incident_type: IncidentType::HighLatency,
        severity: IncidentSeverity::Medium,
        description: "latency test incident".to_string(),
        service_name: "production-service".to_string(),
        metrics_before: degraded_metrics(),
        detected_at: Utc::now(),
    }
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
    .to_string()
}

async fn judge_against(server_url: String) -> anyhow::Result<f64> {
    let oracle = HttpOracle::new(&oracle_config(server_url))?;
    let incident = incident();
    let before = degraded_metrics();
    let after = recovered_metrics();
    let request = JudgeRequest {
        incident: &incident,
        strategy_name: "cache_and_rebalance",
        metrics_before: &before,
        metrics_after: &after,
        recovery_time_seconds: 28.5,
        numeric_reward: 176.67,
    };
    oracle.judge(&request).await
}

#[tokio::test]
async fn parses_judgment_score() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(r#"{"score": 12.5, "analysis": "solid recovery"}"#))
        .create_async()
        .await;

    let score = judge_against(server.url()).await.unwrap();
    assert!((score - 12.5).abs() < f64::EPSILON);
    mock.assert_async().await;
}

#[tokio::test]
async fn clamps_out_of_range_scores() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(r#"{"score": 75.0, "analysis": "overexcited judge"}"#))
        .create_async()
        .await;

    let score = judge_against(server.url()).await.unwrap();
    assert!((score - 20.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn server_error_is_reported_not_defaulted() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    // Defaulting to zero is the control loop's job; the client itself
    // must surface the failure.
    let result = judge_against(server.url()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unparsable_judgment_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body("the service looks fine to me"))
        .create_async()
        .await;

    let result = judge_against(server.url()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_api_key_fails_client_construction() {
    let config = OracleConfig {
        api_key: None,
        ..oracle_config("http://localhost:9".to_string())
    };
    assert!(HttpOracle::new(&config).is_err());
}
