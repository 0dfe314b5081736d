//! Quality-Sim: Cement Quality Simulation Client
//!
//! Orchestration core for a cement strength prediction workbench: dataset
//! upload and training, what-if simulation of mix and process parameters,
//! and derived analytics over the returned predictions.
//!
//! ## Architecture
//!
//! - **Backend**: HTTP access to the training/inference service
//! - **Simulation**: operator-adjustable payload with the derived `lsf`
//! - **Orchestrator**: status resolution, training and prediction state
//!   machines, all owned by one [`Session`]
//! - **Analytics**: impact ranking, strength trend and feature comparison

pub mod analytics;
pub mod backend;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod simulation;
pub mod types;

// Re-export configuration
pub use config::{ClientConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    CellValue, ConfigResponse, DatasetRow, FeatureGroup, FeatureKey, Metrics, MetricsRecord,
    MetricsSource, PredictionResponse, SimulationPayload, SliderConfig, SliderSetting, Status,
    TrainResponse,
};

// Re-export backend access
pub use backend::{Backend, BackendError, DatasetUpload, HttpBackend};

// Re-export orchestration
pub use orchestrator::{Disposition, ErrorBanner, OrchestratorError, Session, SessionState};

// Re-export analytics
pub use analytics::{ComparisonRow, ImpactRow, TrendPoint};
pub use simulation::{compute_lsf, SimulationModel};
