//! Simulation & Prediction Orchestration Core
//!
//! ## Architecture
//!
//! - **StatusResolver**: liveness probe + configuration fetch -> one status
//! - **TrainingOrchestrator**: upload -> train -> reconcile, one at a time
//! - **PredictionOrchestrator**: predict under a minimum-duration gate, one at a time
//! - **Session**: owns all core state, runs every request as a task and
//!   applies task results as [`SessionEvent`]s
//!
//! Results are applied only when they carry the generation currently in
//! flight for their request kind, so a slow superseded response can never
//! overwrite newer state.

mod prediction;
mod request;
mod session;
mod status;
mod training;

pub use prediction::{PredictionOrchestrator, PredictionPhase};
pub use request::{RequestSlot, RequestTicket};
pub use session::{Disposition, Outcome, RequestResult, Session, SessionEvent, SessionState};
pub use status::StatusResolver;
pub use training::{TrainingOrchestrator, TrainingPhase};

use crate::types::Status;

/// How a finished request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Succeeded,
    Failed { reason: String },
}

/// Orchestrator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("A training run is already in progress")]
    TrainingInFlight,
    #[error("A prediction is already in progress")]
    PredictionInFlight,
    #[error("Prediction requires a trained model (status: {0})")]
    NotReady(Status),
    #[error("Training failed: {0}")]
    TrainingFailed(String),
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
    #[error("Request was cancelled before it completed")]
    Cancelled,
}

/// User-visible error banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBanner {
    /// Probe/config could not reach the backend
    BackendUnreachable,
    /// Upload rejected or malformed
    TrainingFailed,
    /// Inference call failed
    PredictionFailed,
}

impl ErrorBanner {
    pub const fn message(self) -> &'static str {
        match self {
            Self::BackendUnreachable => {
                "Unable to reach backend. Confirm the prediction service is running."
            }
            Self::TrainingFailed => "Training failed. Ensure the CSV includes all required columns.",
            Self::PredictionFailed => "Unable to generate prediction. Ensure the model is trained.",
        }
    }
}

impl std::fmt::Display for ErrorBanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
