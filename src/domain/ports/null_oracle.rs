use anyhow::Result;
use async_trait::async_trait;

use super::oracle::{JudgeRequest, JudgmentOracle};

/// No-op oracle: every judgment is a zero adjustment.
///
/// Used when the HTTP oracle is disabled, and as the deterministic stand-in
/// in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOracle;

#[async_trait]
impl JudgmentOracle for NullOracle {
    async fn judge(&self, _request: &JudgeRequest<'_>) -> Result<f64> {
        Ok(0.0)
    }
}
