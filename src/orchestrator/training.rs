//! Training Orchestrator: `idle -> training -> idle`

use tracing::{info, warn};

use super::request::{RequestSlot, RequestTicket};
use super::{Completion, OrchestratorError};

/// Training state machine phase
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrainingPhase {
    #[default]
    Idle,
    Training {
        generation: u64,
        file_name: String,
    },
}

/// Exclusive-access guard and bookkeeping for dataset uploads.
#[derive(Debug, Default)]
pub struct TrainingOrchestrator {
    phase: TrainingPhase,
    slot: RequestSlot,
    last: Option<(u64, Completion)>,
}

impl TrainingOrchestrator {
    pub const fn phase(&self) -> &TrainingPhase {
        &self.phase
    }

    pub const fn is_training(&self) -> bool {
        matches!(self.phase, TrainingPhase::Training { .. })
    }

    /// Enter `training`. Rejected while another upload is in flight.
    pub fn begin(&mut self, file_name: &str) -> Result<RequestTicket, OrchestratorError> {
        if let TrainingPhase::Training { generation, .. } = &self.phase {
            warn!(generation, file = %file_name, "Training already in flight - upload rejected");
            return Err(OrchestratorError::TrainingInFlight);
        }
        let ticket = self.slot.begin();
        self.phase = TrainingPhase::Training {
            generation: ticket.generation,
            file_name: file_name.to_string(),
        };
        info!(generation = ticket.generation, file = %file_name, "Training started");
        Ok(ticket)
    }

    /// Return to `idle` if `generation` is the upload in flight.
    pub fn finish(&mut self, generation: u64, completion: Completion) -> bool {
        if !self.slot.finish(generation) {
            return false;
        }
        self.phase = TrainingPhase::Idle;
        self.last = Some((generation, completion));
        true
    }

    /// How upload `generation` ended, if it was the last one to finish.
    pub fn completion_of(&self, generation: u64) -> Option<&Completion> {
        self.last
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(_, c)| c)
    }

    /// Abandon the upload in flight.
    pub fn cancel(&mut self) {
        if self.slot.cancel() {
            self.phase = TrainingPhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_upload_rejected_while_training() {
        let mut orchestrator = TrainingOrchestrator::default();
        let ticket = orchestrator.begin("plant_a.csv").unwrap();

        assert!(matches!(
            orchestrator.begin("plant_b.csv"),
            Err(OrchestratorError::TrainingInFlight)
        ));
        // The rejected attempt did not disturb the one in flight
        assert!(!ticket.token.is_cancelled());
        assert_eq!(
            orchestrator.phase(),
            &TrainingPhase::Training {
                generation: ticket.generation,
                file_name: "plant_a.csv".into()
            }
        );
    }

    #[test]
    fn finish_returns_to_idle_and_allows_retry() {
        let mut orchestrator = TrainingOrchestrator::default();
        let ticket = orchestrator.begin("plant_a.csv").unwrap();
        assert!(orchestrator.finish(
            ticket.generation,
            Completion::Failed { reason: "missing columns".into() }
        ));
        assert!(!orchestrator.is_training());
        assert!(matches!(
            orchestrator.completion_of(ticket.generation),
            Some(Completion::Failed { .. })
        ));

        let retry = orchestrator.begin("plant_a_fixed.csv").unwrap();
        assert_eq!(retry.generation, ticket.generation + 1);
        assert!(orchestrator.completion_of(retry.generation).is_none());
    }

    #[test]
    fn stale_finish_ignored() {
        let mut orchestrator = TrainingOrchestrator::default();
        let ticket = orchestrator.begin("plant_a.csv").unwrap();
        assert!(!orchestrator.finish(ticket.generation + 7, Completion::Succeeded));
        assert!(orchestrator.is_training());
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut orchestrator = TrainingOrchestrator::default();
        let ticket = orchestrator.begin("plant_a.csv").unwrap();
        orchestrator.cancel();
        assert!(ticket.token.is_cancelled());
        assert!(!orchestrator.is_training());
        assert!(!orchestrator.finish(ticket.generation, Completion::Succeeded));
    }
}
