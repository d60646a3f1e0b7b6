//! Persisted-selection mirror
//!
//! Provides [`PersistedMirror`], the last known server truth. It is only
//! replaced by an accepted fetch or updated after a confirmed write.

use crate::sequence::{FetchSequencer, FetchTicket};
use sde_catalog::{EntityName, SelectionRecord};
use std::collections::HashSet;

/// Server-side selection as last observed
#[derive(Debug, Clone, Default)]
pub struct PersistedMirror {
    records: Vec<SelectionRecord>,
    loaded: bool,
    sequencer: FetchSequencer,
}

impl PersistedMirror {
    /// Empty, not-yet-fetched mirror
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records as last fetched
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[SelectionRecord] {
        &self.records
    }

    /// Whether any fetch or write confirmation has landed
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of persisted records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is persisted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a name is persisted
    #[must_use]
    pub fn contains(&self, name: &EntityName) -> bool {
        self.records.iter().any(|r| &r.name == name)
    }

    /// Tag a fetch about to start
    #[inline]
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.sequencer.issue()
    }

    /// Replace with a fetch result if it is not stale
    ///
    /// Duplicate names in the response keep the first occurrence. Returns
    /// `false` when the result was discarded.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, records: Vec<SelectionRecord>) -> bool {
        if !self.sequencer.accept(ticket) {
            tracing::warn!(%ticket, "discarding stale persisted-selection fetch");
            return false;
        }
        let mut seen = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.name.clone()) {
                unique.push(record);
            } else {
                tracing::warn!(name = %record.name, "server returned duplicate selected SDE");
            }
        }
        self.records = unique;
        self.loaded = true;
        true
    }

    /// Fold a confirmed save into the mirror
    ///
    /// Saved names replace existing entries. Fetches issued before the save
    /// are invalidated.
    pub fn apply_saved(&mut self, saved: &[SelectionRecord]) {
        self.sequencer.supersede();
        for record in saved {
            match self.records.iter_mut().find(|r| r.name == record.name) {
                Some(existing) => *existing = record.clone(),
                None => self.records.push(record.clone()),
            }
        }
        self.loaded = true;
    }

    /// Drop a name after a confirmed removal
    pub fn apply_removed(&mut self, name: &EntityName) -> bool {
        self.sequencer.supersede();
        let before = self.records.len();
        self.records.retain(|r| &r.name != name);
        before != self.records.len()
    }

    /// Empty the mirror after a confirmed clear
    pub fn apply_cleared(&mut self) -> usize {
        self.sequencer.supersede();
        self.loaded = true;
        std::mem::take(&mut self.records).len()
    }
}
