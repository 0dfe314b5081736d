//! HTTP client for the prediction backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Backend, BackendError, DatasetUpload};
use crate::types::{
    ConfigResponse, HealthResponse, PredictionResponse, SimulationPayload, TrainResponse,
};

/// `reqwest`-backed [`Backend`]
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for `base_url`.
    ///
    /// No request timeout is applied unless `timeout` is given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get base URL for logging
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a JSON body, or turn a non-2xx response into `BackendError::Status`.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status,
            detail: error_detail(&body),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Extract `{"detail": ...}` from an error body; falls back to the raw text.
fn error_detail(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map.get("detail").map(|detail| match detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        _ => Some(String::from_utf8_lossy(body).trim().to_string()).filter(|s| !s.is_empty()),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<String, BackendError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        let health: HealthResponse = decode(resp).await?;
        debug!(status = %health.status, "Health probe answered");
        Ok(health.status)
    }

    async fn config(&self) -> Result<ConfigResponse, BackendError> {
        let resp = self.http.get(self.url("/config")).send().await?;
        decode(resp).await
    }

    async fn train(&self, upload: DatasetUpload) -> Result<TrainResponse, BackendError> {
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        debug!(file = %upload.file_name, bytes = size, "Uploading training dataset");
        let resp = self
            .http
            .post(self.url("/train"))
            .multipart(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn predict(&self, payload: &SimulationPayload) -> Result<PredictionResponse, BackendError> {
        let resp = self
            .http
            .post(self.url("/predict"))
            .json(payload)
            .send()
            .await?;
        decode(resp).await
    }
}
