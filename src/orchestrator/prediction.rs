//! Prediction Orchestrator: `idle -> predicting -> idle`
//!
//! A prediction stays in flight for at least `min_duration` so the
//! processing animation always completes; a slower backend is never cut short.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::request::{RequestSlot, RequestTicket};
use super::{Completion, OrchestratorError};
use crate::types::Status;

/// Prediction state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionPhase {
    #[default]
    Idle,
    Predicting {
        generation: u64,
        started_at: Instant,
    },
}

/// Exclusive-access guard and minimum-duration gate for predictions.
#[derive(Debug)]
pub struct PredictionOrchestrator {
    phase: PredictionPhase,
    slot: RequestSlot,
    min_duration: Duration,
    last: Option<(u64, Completion)>,
}

impl PredictionOrchestrator {
    pub fn new(min_duration: Duration) -> Self {
        Self {
            phase: PredictionPhase::Idle,
            slot: RequestSlot::default(),
            min_duration,
            last: None,
        }
    }

    pub const fn phase(&self) -> PredictionPhase {
        self.phase
    }

    pub const fn min_duration(&self) -> Duration {
        self.min_duration
    }

    pub const fn is_predicting(&self) -> bool {
        matches!(self.phase, PredictionPhase::Predicting { .. })
    }

    /// Enter `predicting`. Requires a ready model and no prediction in flight.
    pub fn begin(&mut self, status: Status) -> Result<RequestTicket, OrchestratorError> {
        if self.is_predicting() {
            warn!("Prediction already in flight - request rejected");
            return Err(OrchestratorError::PredictionInFlight);
        }
        if status != Status::Ready {
            warn!(%status, "Prediction requested before the model is ready");
            return Err(OrchestratorError::NotReady(status));
        }
        let ticket = self.slot.begin();
        self.phase = PredictionPhase::Predicting {
            generation: ticket.generation,
            started_at: Instant::now(),
        };
        info!(
            generation = ticket.generation,
            min_duration_ms = u64::try_from(self.min_duration.as_millis()).unwrap_or(u64::MAX),
            "Prediction started"
        );
        Ok(ticket)
    }

    /// Return to `idle` if `generation` is the prediction in flight.
    ///
    /// Yields the time spent in `predicting`.
    pub fn finish(&mut self, generation: u64, completion: Completion) -> Option<Duration> {
        if !self.slot.finish(generation) {
            return None;
        }
        let elapsed = match self.phase {
            PredictionPhase::Predicting { started_at, .. } => started_at.elapsed(),
            PredictionPhase::Idle => Duration::ZERO,
        };
        self.phase = PredictionPhase::Idle;
        self.last = Some((generation, completion));
        Some(elapsed)
    }

    /// How prediction `generation` ended, if it was the last one to finish.
    pub fn completion_of(&self, generation: u64) -> Option<&Completion> {
        self.last
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(_, c)| c)
    }

    /// Abandon the prediction in flight.
    pub fn cancel(&mut self) {
        if self.slot.cancel() {
            self.phase = PredictionPhase::Idle;
        }
    }
}
