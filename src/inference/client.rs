use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::capture::SampledFrame;
use crate::config::EngineConfig;
use crate::error::InferenceError;

/// Classifies one sampled frame against the remote model, returning the raw
/// response payload untouched; shape reconciliation belongs to the
/// normalizer. Implementations never retry — retry policy is the
/// scheduler's fixed cadence.
pub trait PoseClassifier: Send + Sync + 'static {
    fn classify(
        &self,
        frame: SampledFrame,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send;
}

/// Talks to the remote inference endpoint: multipart POST with the frame
/// under the `image` field, fixed request timeout, no auth headers.
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(config: &EngineConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout,
        })
    }
}

impl PoseClassifier for HttpInferenceClient {
    async fn classify(&self, frame: SampledFrame) -> Result<Value, InferenceError> {
        let part = Part::bytes(frame.jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    InferenceError::Timeout(self.request_timeout)
                } else {
                    InferenceError::Transport(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        response.json::<Value>().await.map_err(|err| {
            if err.is_decode() {
                InferenceError::MalformedResponse(err.to_string())
            } else {
                InferenceError::Transport(err)
            }
        })
    }
}
