//! AI inference evaluator: posts the content to a remote model endpoint

use async_trait::async_trait;
use base64::Engine;
use fraudguard_core::{EndpointConfig, EvaluationError, EvaluatorKind, FileContent};
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Instant;

use crate::evaluator::SignalEvaluator;

/// Marker token in the response body that means "fraudulent".
const FRAUD_MARKER: &str = "fraud";

#[derive(Debug, Serialize)]
struct InferenceRequest {
    input: String,
}

/// Calls the inference endpoint once per work item.
///
/// The endpoint is an opaque oracle: the verdict is true iff it answers 200
/// and the body contains the marker token. Any other success status yields
/// false; a non-success status or transport fault is an error.
pub struct AiInferenceEvaluator {
    http_client: reqwest::Client,
    endpoint_url: String,
    api_key: Option<String>,
}

impl Debug for AiInferenceEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // Omit api_key
        f.debug_struct("AiInferenceEvaluator")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AiInferenceEvaluator {
    pub fn new(
        http_client: reqwest::Client,
        endpoint_url: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint_url,
            api_key,
        }
    }

    pub fn from_config(http_client: reqwest::Client, config: &EndpointConfig) -> Self {
        Self::new(http_client, config.url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl SignalEvaluator for AiInferenceEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::AiInference
    }

    #[tracing::instrument(skip(self, content, _user_id), fields(size_bytes = content.len()))]
    async fn evaluate(
        &self,
        content: &FileContent,
        _user_id: &str,
    ) -> Result<bool, EvaluationError> {
        let start = Instant::now();
        let body = InferenceRequest {
            input: base64::engine::general_purpose::STANDARD.encode(&content.bytes),
        };

        let mut request = self
            .http_client
            .post(&self.endpoint_url)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| EvaluationError::Inference {
            status: None,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_millis(),
                "Inference endpoint returned non-success status"
            );
            return Err(EvaluationError::Inference {
                status: Some(status.as_u16()),
                message: error_text,
            });
        }

        let text = response.text().await.map_err(|e| EvaluationError::Inference {
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        let verdict = status == StatusCode::OK && text.contains(FRAUD_MARKER);
        tracing::debug!(
            verdict,
            duration_ms = start.elapsed().as_millis(),
            "Inference evaluation completed"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn evaluator(server: &mockito::Server, api_key: Option<&str>) -> AiInferenceEvaluator {
        AiInferenceEvaluator::new(
            reqwest::Client::new(),
            format!("{}/invocations", server.url()),
            api_key.map(str::to_string),
        )
    }

    fn content(data: &'static [u8]) -> FileContent {
        FileContent::new(data, Some("text/plain".to_string()))
    }

    #[tokio::test]
    async fn test_sends_base64_input_and_detects_marker() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invocations")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "input": "ZnJhdWR1bGVudCBjb250ZW50" })))
            .with_status(200)
            .with_body("fraud detected")
            .create_async()
            .await;

        let verdict = evaluator(&server, None)
            .evaluate(&content(b"fraudulent content"), "u1")
            .await
            .unwrap();

        assert!(verdict);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_clean_body_is_not_fraud() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(200)
            .with_body("No Issues Detected")
            .create_async()
            .await;

        let verdict = evaluator(&server, None)
            .evaluate(&content(b"test-content"), "u1")
            .await
            .unwrap();

        assert!(!verdict);
    }

    #[tokio::test]
    async fn test_marker_match_is_case_sensitive() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(200)
            .with_body("FRAUD")
            .create_async()
            .await;

        let verdict = evaluator(&server, None)
            .evaluate(&content(b"x"), "u1")
            .await
            .unwrap();

        assert!(!verdict);
    }

    #[tokio::test]
    async fn test_non_200_success_status_is_not_fraud() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(202)
            .with_body("fraud")
            .create_async()
            .await;

        let verdict = evaluator(&server, None)
            .evaluate(&content(b"x"), "u1")
            .await
            .unwrap();

        assert!(!verdict);
    }

    #[tokio::test]
    async fn test_error_status_raises_inference_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let err = evaluator(&server, None)
            .evaluate(&content(b"x"), "u1")
            .await
            .unwrap_err();

        match err {
            EvaluationError::Inference { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "model crashed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invocations")
            .match_header("authorization", "Bearer secret-key")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        evaluator(&server, Some("secret-key"))
            .evaluate(&content(b"x"), "u1")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let evaluator = AiInferenceEvaluator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/invocations".to_string(),
            None,
        );

        let err = evaluator.evaluate(&content(b"x"), "u1").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Inference { status: None, .. }));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let evaluator = AiInferenceEvaluator::new(
            reqwest::Client::new(),
            "http://localhost/invocations".to_string(),
            Some("secret-key".to_string()),
        );
        assert!(!format!("{:?}", evaluator).contains("secret-key"));
    }
}
