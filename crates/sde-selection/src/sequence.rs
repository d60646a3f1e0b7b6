//! Fetch generation tagging
//!
//! Every fetch takes a [`FetchTicket`] before suspending. When it completes,
//! the result is applied only if no newer fetch has been applied in the
//! meantime.

use std::fmt::{self, Display, Formatter};

/// Monotonic tag of one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Sequence number
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for FetchTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues tickets and rejects out-of-order completions
#[derive(Debug, Clone, Default)]
pub struct FetchSequencer {
    issued: u64,
    applied: u64,
}

impl FetchSequencer {
    /// Fresh sequencer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a fetch about to start
    #[inline]
    pub fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Claim the right to apply a completed fetch
    ///
    /// Returns `false` for a ticket older than, or equal to, the last one
    /// applied.
    #[inline]
    pub fn accept(&mut self, ticket: FetchTicket) -> bool {
        if ticket.0 > self.applied {
            self.applied = ticket.0;
            true
        } else {
            false
        }
    }

    /// Invalidate every fetch issued so far
    ///
    /// Used after a confirmed local write so that a response issued before
    /// the write cannot overwrite it.
    #[inline]
    pub fn supersede(&mut self) {
        self.applied = self.issued;
    }

    /// Whether `ticket` is the most recently issued one
    #[inline]
    #[must_use]
    pub fn is_latest(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Last applied sequence number (0 if none)
    #[inline]
    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_completions_apply() {
        let mut seq = FetchSequencer::new();
        let a = seq.issue();
        assert!(seq.accept(a));
        let b = seq.issue();
        assert!(seq.accept(b));
        assert_eq!(seq.last_applied(), 2);
    }

    #[test]
    fn stale_completion_rejected() {
        let mut seq = FetchSequencer::new();
        let slow = seq.issue();
        let fast = seq.issue();

        assert!(seq.accept(fast));
        assert!(!seq.accept(slow));
    }

    #[test]
    fn older_completion_first_still_applies() {
        let mut seq = FetchSequencer::new();
        let first = seq.issue();
        let second = seq.issue();

        assert!(seq.accept(first));
        assert!(seq.accept(second));
    }

    #[test]
    fn supersede_discards_in_flight() {
        let mut seq = FetchSequencer::new();
        let in_flight = seq.issue();
        seq.supersede();

        assert!(!seq.accept(in_flight));
        let next = seq.issue();
        assert!(seq.is_latest(next));
        assert!(seq.accept(next));
    }
}
