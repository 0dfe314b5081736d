//! Prediction backend access
//!
//! The orchestration core talks to the training/inference service only
//! through the [`Backend`] trait. [`HttpBackend`] is the production
//! implementation; tests substitute scripted in-process backends.
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness probe
//! - `GET /config` - slider bounds, readiness, metrics, sample rows
//! - `POST /train` - multipart CSV upload (field `file`)
//! - `POST /predict` - JSON simulation payload

mod client;

pub use client::HttpBackend;

use std::path::Path;

use async_trait::async_trait;

use crate::types::{ConfigResponse, PredictionResponse, SimulationPayload, TrainResponse};

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {status}{}", detail_suffix(.detail))]
    Status {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Dataset read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Backend task panicked")]
    TaskPanicked,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// CSV dataset selected for training
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DatasetUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a dataset from disk.
    pub async fn from_path(path: &Path) -> Result<Self, BackendError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "dataset.csv".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }
}

/// Training/inference service seam
#[async_trait]
pub trait Backend: Send + Sync {
    /// Liveness probe; returns the raw status token.
    async fn health(&self) -> Result<String, BackendError>;

    /// Slider configuration, readiness flag, metrics and sample rows.
    async fn config(&self) -> Result<ConfigResponse, BackendError>;

    /// Train on an uploaded CSV.
    async fn train(&self, upload: DatasetUpload) -> Result<TrainResponse, BackendError>;

    /// Run inference for one payload.
    async fn predict(&self, payload: &SimulationPayload) -> Result<PredictionResponse, BackendError>;
}
