//! Save delta between pending and persisted selections
//!
//! Provides [`compute_save_delta`] and [`SavePreview`]. Identity is by
//! name only: sensitivity or protection drift on an already-saved name is
//! not a conflict and does not produce a delta entry.

use sde_catalog::{EntityName, SelectionRecord};
use std::collections::HashSet;

/// Pending records whose name is absent from `persisted`
///
/// Pending order is preserved. Repeated pending names yield one entry.
#[must_use]
pub fn compute_save_delta(
    pending: &[SelectionRecord],
    persisted: &[SelectionRecord],
) -> Vec<SelectionRecord> {
    let saved: HashSet<&EntityName> = persisted.iter().map(|r| &r.name).collect();
    let mut seen = HashSet::with_capacity(pending.len());
    pending
        .iter()
        .filter(|r| !saved.contains(&r.name) && seen.insert(&r.name))
        .cloned()
        .collect()
}

/// What the delta was computed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedBasis {
    /// A fetch of server truth made for this preview
    Fresh,
    /// Server truth could not be fetched; every pending record is in the delta
    Unavailable {
        /// Why the fetch failed
        reason: String,
    },
}

/// Confirmable save preview
///
/// An empty delta is still a preview: the user asked to save and gets an
/// explicit "already saved" answer instead of a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePreview {
    delta: Vec<SelectionRecord>,
    already_saved: usize,
    basis: PersistedBasis,
}

impl SavePreview {
    /// Preview against fetched server truth
    #[must_use]
    pub fn compute(pending: &[SelectionRecord], persisted: &[SelectionRecord]) -> Self {
        let delta = compute_save_delta(pending, persisted);
        let already_saved = distinct_names(pending).saturating_sub(delta.len());
        Self {
            delta,
            already_saved,
            basis: PersistedBasis::Fresh,
        }
    }

    /// Preview when server truth is unavailable
    ///
    /// Fails open: the whole pending set is shown, so nothing is silently
    /// skipped.
    #[must_use]
    pub fn fail_open(pending: &[SelectionRecord], reason: impl Into<String>) -> Self {
        Self {
            delta: compute_save_delta(pending, &[]),
            already_saved: 0,
            basis: PersistedBasis::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Records that would be sent
    #[inline]
    #[must_use]
    pub fn delta(&self) -> &[SelectionRecord] {
        &self.delta
    }

    /// Consume into the records to send
    #[inline]
    #[must_use]
    pub fn into_delta(self) -> Vec<SelectionRecord> {
        self.delta
    }

    /// Number of pending names already persisted
    #[inline]
    #[must_use]
    pub fn already_saved(&self) -> usize {
        self.already_saved
    }

    /// Whether there is nothing new to save
    #[inline]
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.delta.is_empty()
    }

    /// What the delta was computed against
    #[inline]
    #[must_use]
    pub fn basis(&self) -> &PersistedBasis {
        &self.basis
    }

    /// Whether server truth was unavailable
    #[inline]
    #[must_use]
    pub fn is_fail_open(&self) -> bool {
        matches!(self.basis, PersistedBasis::Unavailable { .. })
    }

    /// One-line summary for the confirmation prompt
    #[must_use]
    pub fn summary(&self) -> String {
        if self.delta.is_empty() {
            return if self.is_fail_open() {
                "Nothing selected".to_string()
            } else {
                "All selected SDEs are already saved".to_string()
            };
        }
        let noun = if self.delta.len() == 1 { "SDE" } else { "SDEs" };
        let mut line = format!("{} new {noun} will be saved", self.delta.len());
        if self.already_saved > 0 {
            line.push_str(&format!(" ({} already saved)", self.already_saved));
        }
        if self.is_fail_open() {
            line.push_str("; saved selections could not be checked");
        }
        line
    }
}

fn distinct_names(records: &[SelectionRecord]) -> usize {
    records.iter().map(|r| &r.name).collect::<HashSet<_>>().len()
}
