//! HTTP judgment oracle.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint. The oracle is
//! advisory: the caller treats any error (timeout, bad status, unparsable
//! reply) as a zero adjustment, so this client reports failures instead of
//! retrying them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::domain::models::OracleConfig;
use crate::domain::ports::{JudgeRequest, JudgmentOracle, ADJUSTMENT_BOUND};

/// HTTP client for the judgment oracle.
pub struct HttpOracle {
    http_client: ReqwestClient,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Judgment {
    score: f64,
}

impl HttpOracle {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Fails when no API key is configured or the HTTP client cannot be
    /// built.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("oracle enabled but no api_key configured")?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn prompt_for(request: &JudgeRequest<'_>) -> String {
        let before = request.metrics_before;
        let after = request.metrics_after;
        format!(
            "You are an expert SRE evaluating an automated remediation.\n\
             Incident: {} ({}), Strategy: {}, Recovery: {:.1}s\n\
             Numeric reward: {:.2}\n\
             Before: latency={:.0}ms, cpu={:.0}%, error_rate={:.2}, availability={:.2}\n\
             After: latency={:.0}ms, cpu={:.0}%, error_rate={:.2}, availability={:.2}\n\
             Respond in JSON: {{\"score\": <adjustment between -{bound} and {bound}>, \
             \"analysis\": \"<2 sentences>\"}}",
            request.incident.incident_type,
            request.incident.severity,
            request.strategy_name,
            request.recovery_time_seconds,
            request.numeric_reward,
            before.latency_ms,
            before.cpu_percent,
            before.error_rate,
            before.availability,
            after.latency_ms,
            after.cpu_percent,
            after.error_rate,
            after.availability,
            bound = ADJUSTMENT_BOUND,
        )
    }
}

#[async_trait]
impl JudgmentOracle for HttpOracle {
    async fn judge(&self, request: &JudgeRequest<'_>) -> Result<f64> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert SRE. Respond with valid JSON only."
                },
                { "role": "user", "content": Self::prompt_for(request) }
            ],
            "temperature": 0.3,
            "max_tokens": 200,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("oracle request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("oracle returned {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse oracle response")?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .context("oracle response has no choices")?;
        let judgment: Judgment =
            serde_json::from_str(content).context("oracle reply is not valid judgment JSON")?;

        Ok(judgment.score.clamp(-ADJUSTMENT_BOUND, ADJUSTMENT_BOUND))
    }
}
