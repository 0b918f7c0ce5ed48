//! Identity history evaluator: asks the legacy system about a user's past

use async_trait::async_trait;
use fraudguard_core::{EndpointConfig, EvaluationError, EvaluatorKind, FileContent};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::evaluator::SignalEvaluator;

const CHECK_PATH: &str = "checkFraud";

/// Calls `GET {base}/checkFraud?userId=...` and reads a boolean answer.
///
/// A missing or non-boolean body counts as "not fraudulent". Transport faults
/// and non-success statuses are reported as `LegacyCall` errors; whether
/// those abort anything is up to the guard wrapping this evaluator.
pub struct IdentityHistoryEvaluator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Debug for IdentityHistoryEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("IdentityHistoryEvaluator")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl IdentityHistoryEvaluator {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(http_client: reqwest::Client, config: &EndpointConfig) -> Self {
        Self::new(http_client, config.url.clone(), config.api_key.clone())
    }

    fn check_url(&self) -> String {
        format!("{}/{}", self.base_url, CHECK_PATH)
    }
}

/// Interpret the legacy response body. Only a JSON `true` means fraud.
fn parse_verdict(body: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(body.trim()),
        Ok(serde_json::Value::Bool(true))
    )
}

#[async_trait]
impl SignalEvaluator for IdentityHistoryEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::IdentityHistory
    }

    #[tracing::instrument(skip(self, _content))]
    async fn evaluate(
        &self,
        _content: &FileContent,
        user_id: &str,
    ) -> Result<bool, EvaluationError> {
        let mut request = self
            .http_client
            .get(self.check_url())
            .query(&[("userId", user_id)]);
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EvaluationError::LegacyCall(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvaluationError::LegacyCall(format!(
                "legacy system returned status {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EvaluationError::LegacyCall(e.to_string()))?;

        let verdict = parse_verdict(&body);
        if !verdict && !body.trim().eq_ignore_ascii_case("false") {
            tracing::debug!(body = %body, "Non-boolean legacy response treated as not fraudulent");
        }
        Ok(verdict)
    }
}
