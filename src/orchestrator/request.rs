//! Request generations and cancellation
//!
//! Every request kind owns a [`RequestSlot`]. Beginning a request bumps the
//! generation and cancels the token of the one it supersedes; a result is
//! only applied if it carries the generation currently in flight.

use tokio_util::sync::CancellationToken;

/// Handed to the task that performs one request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Generation counter plus the token of the request in flight, if any.
#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    active: Option<CancellationToken>,
}

impl RequestSlot {
    /// Start a new generation, cancelling any request still in flight.
    pub fn begin(&mut self) -> RequestTicket {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        RequestTicket {
            generation: self.generation,
            token,
        }
    }

    pub const fn in_flight(&self) -> bool {
        self.active.is_some()
    }

    /// Generation in flight, if any.
    pub const fn current(&self) -> Option<u64> {
        if self.active.is_some() {
            Some(self.generation)
        } else {
            None
        }
    }

    /// Close the slot if `generation` is the one in flight.
    ///
    /// Returns false for results of superseded or cancelled requests.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.current() == Some(generation) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Cancel the request in flight. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_supersedes_and_cancels_previous() {
        let mut slot = RequestSlot::default();
        let first = slot.begin();
        let second = slot.begin();

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert_eq!(second.generation, first.generation + 1);
        assert_eq!(slot.current(), Some(second.generation));
    }

    #[test]
    fn only_current_generation_finishes() {
        let mut slot = RequestSlot::default();
        let old = slot.begin();
        let new = slot.begin();

        assert!(!slot.finish(old.generation));
        assert!(slot.in_flight());
        assert!(slot.finish(new.generation));
        assert!(!slot.in_flight());
        // A duplicate delivery is stale too
        assert!(!slot.finish(new.generation));
    }

    #[test]
    fn cancel_closes_slot() {
        let mut slot = RequestSlot::default();
        let ticket = slot.begin();
        assert!(slot.cancel());
        assert!(ticket.token.is_cancelled());
        assert!(!slot.finish(ticket.generation));
        assert!(!slot.cancel());
    }
}
