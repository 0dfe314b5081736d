//! Status Resolver
//!
//! Merges the liveness probe and the configuration fetch into one status
//! with a fixed precedence instead of last-write-wins:
//!
//! 1. An authoritative signal (configuration result, successful training)
//!    always wins over the probe
//! 2. The probe is provisional and only shows while nothing authoritative
//!    has landed
//! 3. With neither, the status is `loading`

use tracing::{debug, info};

use super::request::{RequestSlot, RequestTicket};
use crate::types::Status;

/// Owns the readiness status and the two request slots feeding it.
#[derive(Debug, Default)]
pub struct StatusResolver {
    probe: Option<Status>,
    authoritative: Option<Status>,
    probe_slot: RequestSlot,
    config_slot: RequestSlot,
}

impl StatusResolver {
    /// Resolved status.
    pub fn current(&self) -> Status {
        self.authoritative.or(self.probe).unwrap_or(Status::Loading)
    }

    pub fn begin_probe(&mut self) -> RequestTicket {
        self.probe_slot.begin()
    }

    /// Start a configuration fetch, superseding any older one.
    ///
    /// The previous authoritative status stays in effect until this fetch lands.
    pub fn begin_config(&mut self) -> RequestTicket {
        self.config_slot.begin()
    }

    pub const fn config_in_flight(&self) -> bool {
        self.config_slot.in_flight()
    }

    pub const fn probe_in_flight(&self) -> bool {
        self.probe_slot.in_flight()
    }

    /// Record a probe result; `None` means the probe failed.
    ///
    /// Returns false if the result belongs to a superseded probe.
    pub fn on_probe(&mut self, generation: u64, token: Option<&str>) -> bool {
        if !self.probe_slot.finish(generation) {
            return false;
        }
        let observed = token.map_or(Status::WaitingForData, Status::from_probe_token);
        self.set(|s| s.probe = Some(observed), "probe");
        true
    }

    /// Record a configuration result; `None` means the fetch failed.
    ///
    /// Returns false if the result belongs to a superseded fetch.
    pub fn on_config(&mut self, generation: u64, dataset_ready: Option<bool>) -> bool {
        if !self.config_slot.finish(generation) {
            return false;
        }
        let observed = dataset_ready.map_or(Status::WaitingForData, Status::from_dataset_ready);
        self.set(|s| s.authoritative = Some(observed), "config");
        true
    }

    /// A training response proves a model exists.
    pub fn on_training_success(&mut self) {
        self.set(|s| s.authoritative = Some(Status::Ready), "training");
    }

    /// Cancel both requests.
    pub fn cancel(&mut self) {
        self.probe_slot.cancel();
        self.config_slot.cancel();
    }

    fn set(&mut self, update: impl FnOnce(&mut Self), source: &'static str) {
        let before = self.current();
        update(self);
        let after = self.current();
        if before == after {
            debug!(status = %after, source, "Status unchanged");
        } else {
            info!(from = %before, to = %after, source, "Status changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading() {
        assert_eq!(StatusResolver::default().current(), Status::Loading);
    }

    #[test]
    fn probe_shows_until_config_lands() {
        let mut resolver = StatusResolver::default();
        let probe = resolver.begin_probe();
        let config = resolver.begin_config();

        assert!(resolver.on_probe(probe.generation, Some("ready")));
        assert_eq!(resolver.current(), Status::Ready);

        assert!(resolver.on_config(config.generation, Some(false)));
        assert_eq!(resolver.current(), Status::WaitingForData);
    }

    #[test]
    fn config_wins_regardless_of_arrival_order() {
        let mut resolver = StatusResolver::default();
        let probe = resolver.begin_probe();
        let config = resolver.begin_config();

        assert!(resolver.on_config(config.generation, Some(true)));
        assert!(resolver.on_probe(probe.generation, Some("waiting_for_data")));
        assert_eq!(resolver.current(), Status::Ready);
    }

    #[test]
    fn failed_config_then_successful_probe_stays_waiting() {
        let mut resolver = StatusResolver::default();
        let probe = resolver.begin_probe();
        let config = resolver.begin_config();

        assert!(resolver.on_config(config.generation, None));
        assert!(resolver.on_probe(probe.generation, Some("ready")));
        assert_eq!(resolver.current(), Status::WaitingForData);
    }

    #[test]
    fn failed_or_unknown_probe_means_waiting() {
        let mut resolver = StatusResolver::default();
        let ticket = resolver.begin_probe();
        assert!(resolver.on_probe(ticket.generation, None));
        assert_eq!(resolver.current(), Status::WaitingForData);

        let ticket = resolver.begin_probe();
        assert!(resolver.on_probe(ticket.generation, Some("booting")));
        assert_eq!(resolver.current(), Status::WaitingForData);
    }

    #[test]
    fn superseded_config_result_is_discarded() {
        let mut resolver = StatusResolver::default();
        let stale = resolver.begin_config();
        let fresh = resolver.begin_config();

        assert!(stale.token.is_cancelled());
        assert!(!resolver.on_config(stale.generation, Some(true)));
        assert_eq!(resolver.current(), Status::Loading);
        assert!(resolver.config_in_flight());

        assert!(resolver.on_config(fresh.generation, Some(false)));
        assert_eq!(resolver.current(), Status::WaitingForData);
    }

    #[test]
    fn training_success_is_authoritative_until_next_config() {
        let mut resolver = StatusResolver::default();
        let config = resolver.begin_config();
        assert!(resolver.on_config(config.generation, Some(false)));

        resolver.on_training_success();
        assert_eq!(resolver.current(), Status::Ready);

        // Refresh in flight keeps the previous value
        let refresh = resolver.begin_config();
        assert_eq!(resolver.current(), Status::Ready);
        assert!(resolver.on_config(refresh.generation, Some(true)));
        assert_eq!(resolver.current(), Status::Ready);
    }
}
