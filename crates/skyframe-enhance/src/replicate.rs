//! Replicate API client for video enhancement
//!
//! Predictions are created against a model slug and polled until they reach
//! a terminal state. Model: https://replicate.com/lucataco/real-esrgan-video

use crate::catalog::EnhanceModel;
use crate::error::EnhanceError;
use crate::provider::{EnhanceProvider, PollOutcome};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

/// Default Replicate REST endpoint. Overridable for testing.
pub const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

/// Replicate REST API client.
///
/// Control-plane calls (create, poll) share one short-timeout client;
/// artifact downloads use a separate client with a generous timeout because
/// enhanced videos can be large.
pub struct ReplicateClient {
    http_client: reqwest::Client,
    fetch_client: reqwest::Client,
    api_base: String,
    api_token: String,
    scale_factor: u32,
}

impl Debug for ReplicateClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ReplicateClient")
            .field("api_base", &self.api_base)
            .field("scale_factor", &self.scale_factor)
            .finish()
    }
}

// Replicate API structures
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl ReplicateClient {
    pub fn new(
        api_token: String,
        api_base: String,
        scale_factor: u32,
        request_timeout: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, EnhanceError> {
        let http_client = reqwest::Client::builder().timeout(request_timeout).build()?;
        let fetch_client = reqwest::Client::builder().timeout(fetch_timeout).build()?;

        Ok(Self {
            http_client,
            fetch_client,
            api_base,
            api_token,
            scale_factor,
        })
    }

    /// Build the prediction input for a model.
    ///
    /// Input schemas vary per model family. real-esrgan takes the video
    /// under `video_path` plus a scale factor; the others take `video`.
    fn prediction_input(&self, source_url: &str, model: &EnhanceModel) -> Value {
        if model.slug.contains("real-esrgan") {
            json!({
                "video_path": source_url,
                "scale": self.scale_factor,
            })
        } else {
            json!({
                "video": source_url,
            })
        }
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.api_token)
    }
}

/// Extract the artifact URL from a prediction output.
///
/// Output shapes vary by model. Handle the common patterns: a bare URL
/// string, a list of URLs, or an object keyed by a well-known field.
fn extract_output_url(output: Option<&Value>) -> Option<String> {
    match output? {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.iter().find_map(|item| item.as_str().map(str::to_string)),
        Value::Object(map) => ["video", "output", "enhanced_video", "result"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string())
            }),
        _ => None,
    }
}

#[async_trait]
impl EnhanceProvider for ReplicateClient {
    async fn submit(
        &self,
        source_url: &str,
        model: &EnhanceModel,
    ) -> Result<String, EnhanceError> {
        if !self.configured() {
            return Err(EnhanceError::NotConfigured);
        }

        let url = format!("{}/predictions", self.api_base);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&json!({
                "version": model.slug,
                "input": self.prediction_input(source_url, model),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EnhanceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let prediction: PredictionResponse = response.json().await?;

        tracing::info!(
            prediction_id = %prediction.id,
            model = %model.slug,
            "Replicate prediction created"
        );

        Ok(prediction.id)
    }

    async fn poll(&self, provider_id: &str) -> Result<PollOutcome, EnhanceError> {
        let url = format!("{}/predictions/{}", self.api_base, provider_id);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EnhanceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let prediction: PredictionResponse = response.json().await?;

        match prediction.status.as_str() {
            "succeeded" => match extract_output_url(prediction.output.as_ref()) {
                Some(result_url) => Ok(PollOutcome::Succeeded { result_url }),
                // A success without an artifact cannot recover by waiting.
                None => Ok(PollOutcome::Failed {
                    error: "No output URL returned from Replicate".to_string(),
                }),
            },
            "failed" => Ok(PollOutcome::Failed {
                error: prediction
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
            "canceled" => Ok(PollOutcome::Failed {
                error: "Prediction was canceled".to_string(),
            }),
            other => {
                tracing::debug!(
                    prediction_id = %provider_id,
                    status = %other,
                    "Replicate prediction still running"
                );
                Ok(PollOutcome::Running { progress: None })
            }
        }
    }

    async fn fetch_result(&self, result_url: &str) -> Result<Bytes, EnhanceError> {
        tracing::info!(url = %result_url, "Downloading enhanced video from Replicate");

        let response = self.fetch_client.get(result_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnhanceError::Rejected {
                status: status.as_u16(),
                message: format!("Artifact download returned {}", status),
            });
        }

        Ok(response.bytes().await?)
    }

    fn configured(&self) -> bool {
        !self.api_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_model;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> ReplicateClient {
        ReplicateClient::new(
            "test-token".to_string(),
            server.url(),
            2,
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_prediction_input_real_esrgan() {
        let model = find_model("upscale").unwrap();
        let client = ReplicateClient::new(
            "t".to_string(),
            REPLICATE_API_BASE.to_string(),
            2,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();

        let input = client.prediction_input("http://host/video.mp4", model);
        assert_eq!(input["video_path"], "http://host/video.mp4");
        assert_eq!(input["scale"], 2);
    }

    #[test]
    fn test_prediction_input_generic() {
        let model = find_model("upscale_premium").unwrap();
        let client = ReplicateClient::new(
            "t".to_string(),
            REPLICATE_API_BASE.to_string(),
            2,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();

        let input = client.prediction_input("http://host/video.mp4", model);
        assert_eq!(input["video"], "http://host/video.mp4");
        assert!(input.get("scale").is_none());
    }

    #[test]
    fn test_extract_output_url_string() {
        let output = json!("https://replicate.delivery/out.mp4");
        assert_eq!(
            extract_output_url(Some(&output)),
            Some("https://replicate.delivery/out.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_output_url_array_takes_first_string() {
        let output = json!([42, "https://replicate.delivery/a.mp4", "https://b"]);
        assert_eq!(
            extract_output_url(Some(&output)),
            Some("https://replicate.delivery/a.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_output_url_object_common_keys() {
        let output = json!({"enhanced_video": "https://replicate.delivery/e.mp4"});
        assert_eq!(
            extract_output_url(Some(&output)),
            Some("https://replicate.delivery/e.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_output_url_none() {
        assert_eq!(extract_output_url(None), None);
        let output = json!({"unrelated": true});
        assert_eq!(extract_output_url(Some(&output)), None);
    }

    #[tokio::test]
    async fn test_submit_posts_prediction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predictions")
            .match_header("authorization", "Token test-token")
            .match_body(Matcher::PartialJson(json!({
                "version": "lucataco/real-esrgan-video",
                "input": {"scale": 2},
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "pred-123", "status": "starting"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let model = find_model("upscale").unwrap();

        let id = client
            .submit("http://localhost:8000/media/uploads/x.mp4", model)
            .await
            .unwrap();

        assert_eq!(id, "pred-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_rejected_on_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(422)
            .with_body("Invalid version")
            .create_async()
            .await;

        let client = client_for(&server);
        let model = find_model("upscale").unwrap();

        let err = client.submit("http://host/v.mp4", model).await.unwrap_err();
        match err {
            EnhanceError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("Invalid version"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_without_token() {
        let client = ReplicateClient::new(
            String::new(),
            REPLICATE_API_BASE.to_string(),
            2,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let model = find_model("upscale").unwrap();

        assert!(!client.configured());
        let err = client.submit("http://host/v.mp4", model).await.unwrap_err();
        assert!(matches!(err, EnhanceError::NotConfigured));
    }

    #[tokio::test]
    async fn test_poll_running() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred-123")
            .match_header("authorization", "Token test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "pred-123", "status": "processing"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let outcome = client.poll("pred-123").await.unwrap();
        assert_eq!(outcome, PollOutcome::Running { progress: None });
    }

    #[tokio::test]
    async fn test_poll_succeeded_with_output() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "pred-123", "status": "succeeded", "output": "https://replicate.delivery/out.mp4"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let outcome = client.poll("pred-123").await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Succeeded {
                result_url: "https://replicate.delivery/out.mp4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_poll_succeeded_without_output_is_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "pred-123", "status": "succeeded", "output": null}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let outcome = client.poll("pred-123").await.unwrap();
        assert!(matches!(outcome, PollOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_poll_failed_carries_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "pred-123", "status": "failed", "error": "CUDA out of memory"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let outcome = client.poll("pred-123").await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Failed {
                error: "CUDA out of memory".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_poll_canceled_is_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "pred-123", "status": "canceled"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let outcome = client.poll("pred-123").await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Failed {
                error: "Prediction was canceled".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_result_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/outputs/enhanced.mp4")
            .with_status(200)
            .with_body(&b"enhanced bytes"[..])
            .create_async()
            .await;

        let client = client_for(&server);
        let url = format!("{}/outputs/enhanced.mp4", server.url());
        let data = client.fetch_result(&url).await.unwrap();
        assert_eq!(&data[..], b"enhanced bytes");
    }

    #[tokio::test]
    async fn test_fetch_result_rejected_on_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/outputs/gone.mp4")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let url = format!("{}/outputs/gone.mp4", server.url());
        let err = client.fetch_result(&url).await.unwrap_err();
        assert!(matches!(err, EnhanceError::Rejected { status: 404, .. }));
    }
}
