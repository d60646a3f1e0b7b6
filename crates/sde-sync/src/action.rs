//! Destructive-action lifecycle
//!
//! Saving, removing one selection and clearing all selections share one
//! state machine. Local state only changes on the `Committing -> Succeeded`
//! edge; every other edge is presentation.

use crate::error::SyncError;
use sde_catalog::EntityName;
use sde_selection::SavePreview;

/// Phase of the current destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionPhase {
    /// Nothing pending
    #[default]
    Idle,
    /// Preview shown, waiting for the operator
    Previewing,
    /// Operator confirmed
    Confirmed,
    /// Request in flight
    Committing,
    /// Server accepted the change
    Succeeded,
    /// Server rejected the change or was unreachable
    Failed,
    /// Operator dismissed the preview
    Cancelled,
}

impl ActionPhase {
    /// Check if a request is in flight or about to be
    #[inline]
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Confirmed | Self::Committing)
    }
}

/// Validate a phase transition
///
/// # Errors
/// Returns [`SyncError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: ActionPhase, to: ActionPhase) -> Result<(), SyncError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SyncError::IllegalTransition { from, to })
    }
}

/// Phases reachable in one step
#[must_use]
pub fn allowed_transitions(from: ActionPhase) -> Vec<ActionPhase> {
    use ActionPhase::{Cancelled, Committing, Confirmed, Failed, Idle, Previewing, Succeeded};
    match from {
        Idle => vec![Previewing],
        Previewing => vec![Confirmed, Cancelled],
        Confirmed => vec![Committing],
        Committing => vec![Succeeded, Failed],
        Succeeded | Cancelled => vec![Idle],
        Failed => vec![Previewing],
    }
}

/// What the operator is being asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPreview {
    /// Send the save delta
    Save(SavePreview),
    /// Remove one saved selection
    RemoveOne {
        /// Entity to remove
        name: EntityName,
        /// Whether the mirror currently holds it
        persisted: bool,
    },
    /// Remove every saved selection
    ClearAll {
        /// Saved selections at preview time
        count: usize,
    },
}

impl ActionPreview {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Save(_) => "save",
            Self::RemoveOne { .. } => "remove",
            Self::ClearAll { .. } => "clear-all",
        }
    }

    /// Confirmation prompt text
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Save(preview) => preview.summary(),
            Self::RemoveOne { name, persisted: true } => format!("Remove saved SDE '{name}'?"),
            Self::RemoveOne { name, persisted: false } => {
                format!("'{name}' is not in the last fetched saved list. Remove it anyway?")
            }
            Self::ClearAll { count } => format!("Remove all {count} saved SDEs?"),
        }
    }
}

/// A destructive action and its phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    preview: ActionPreview,
    phase: ActionPhase,
}

impl PendingAction {
    /// Open a preview (`Idle -> Previewing`)
    #[must_use]
    pub fn open(preview: ActionPreview) -> Self {
        Self {
            preview,
            phase: ActionPhase::Previewing,
        }
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    /// What is being confirmed
    #[inline]
    #[must_use]
    pub fn preview(&self) -> &ActionPreview {
        &self.preview
    }

    /// Move to `to`
    ///
    /// # Errors
    /// Returns error if the transition is illegal; the phase is unchanged
    pub fn advance(&mut self, to: ActionPhase) -> Result<(), SyncError> {
        validate_transition(self.phase, to)?;
        tracing::debug!(action = self.preview.label(), from = ?self.phase, to = ?to, "action transition");
        self.phase = to;
        Ok(())
    }

    /// Walk a sequence of transitions, stopping at the first illegal one
    ///
    /// # Errors
    /// Returns error on the first illegal step
    pub fn advance_through(&mut self, path: &[ActionPhase]) -> Result<(), SyncError> {
        path.iter().try_for_each(|to| self.advance(*to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActionPhase::*;

    #[test]
    fn happy_path_is_legal() {
        let mut action = PendingAction::open(ActionPreview::ClearAll { count: 2 });
        action
            .advance_through(&[Confirmed, Committing, Succeeded, Idle])
            .unwrap();
        assert_eq!(action.phase(), Idle);
    }

    #[test]
    fn failure_returns_to_preview() {
        let mut action = PendingAction::open(ActionPreview::ClearAll { count: 2 });
        action.advance_through(&[Confirmed, Committing, Failed, Previewing]).unwrap();
        assert_eq!(action.phase(), Previewing);
    }

    #[test]
    fn cannot_commit_without_confirm() {
        let mut action = PendingAction::open(ActionPreview::ClearAll { count: 0 });
        let err = action.advance(Committing).unwrap_err();

        assert_eq!(err, SyncError::IllegalTransition { from: Previewing, to: Committing });
        assert_eq!(action.phase(), Previewing);
    }

    #[test]
    fn in_flight_phases() {
        assert!(Confirmed.is_in_flight());
        assert!(Committing.is_in_flight());
        assert!(!Previewing.is_in_flight());
    }

    #[test]
    fn remove_summary_mentions_unsaved() {
        let name = EntityName::new("ssn").unwrap();
        let preview = ActionPreview::RemoveOne { name, persisted: false };
        assert!(preview.summary().contains("not in the last fetched"));
    }
}
