//! Error types for the sync boundary
//!
//! Every backend outcome is translated into [`SyncError`] before it reaches
//! callers. Each variant knows how it should be presented to the operator:
//! - Network failures are worth retrying by hand
//! - Constraint violations name the blocking finding count
//! - Not-found on removal is a benign race
//! - Forbidden is terminal

use crate::action::ActionPhase;
use crate::feedback::Severity;
use sde_catalog::{EntityId, ValidationError};
use serde::Deserialize;

/// Main sync error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// Catalogue entry rejected client-side
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Removal blocked by findings that reference the entity (409)
    #[error("constraint violation: {0}")]
    ConstraintViolation(ConstraintConflict),

    /// Entity already gone server-side (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied (401/403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Any other non-2xx response
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Raw server message
        message: String,
    },

    /// 2xx response with an unexpected body
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Another submit is in flight; this one was dropped
    #[error("another operation is in progress")]
    Busy,

    /// Confirm or cancel without a preview
    #[error("no action awaiting confirmation")]
    NothingToConfirm,

    /// State machine rejected a transition
    #[error("illegal action transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: ActionPhase,
        /// Requested phase
        to: ActionPhase,
    },

    /// Toggle of an id not in the current catalog batch
    #[error("unknown entity id {0}")]
    UnknownEntity(EntityId),

    /// Client misconfiguration (bad base URL, TLS setup)
    #[error("client configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Check if a manual retry may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the error reflects a harmless race rather than a failure
    #[inline]
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Busy)
    }

    /// Check if retrying can never help
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Severity of the feedback notice for this error
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::ConstraintViolation(_) => Severity::Constraint,
            Self::NotFound(_) | Self::Busy => Severity::Routine,
            Self::Validation(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Operator-facing text
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Validation(e) => format!("Cannot add SDE: {e}."),
            Self::ConstraintViolation(conflict) => conflict.user_message(),
            Self::NotFound(_) => "That SDE was already removed.".to_string(),
            Self::Forbidden(_) => {
                "You do not have permission to change SDE selections.".to_string()
            }
            Self::Server { status, message } if message.trim().is_empty() => {
                format!("Server error ({status}).")
            }
            Self::Server { message, .. } => message.clone(),
            Self::MalformedResponse(_) => "Unexpected response from the server.".to_string(),
            Self::Busy => "Another operation is still in progress.".to_string(),
            Self::NothingToConfirm => "Nothing is waiting for confirmation.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Entities named in a constraint violation
///
/// The backend sends either the names or only a count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AffectedSdes {
    /// Names of the blocked entities
    Names(Vec<String>),
    /// Number of blocked entities
    Count(u64),
}

impl AffectedSdes {
    /// Number of blocked entities
    #[inline]
    #[must_use]
    pub fn count(&self) -> u64 {
        match self {
            Self::Names(names) => names.len() as u64,
            Self::Count(n) => *n,
        }
    }

    /// Names, when the backend sent them
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Names(names) => names,
            Self::Count(_) => &[],
        }
    }
}

impl Default for AffectedSdes {
    fn default() -> Self {
        Self::Names(Vec::new())
    }
}

/// Detail of a 409 removal conflict
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConstraintConflict {
    /// Entities that could not be removed
    #[serde(default)]
    pub affected_sdes: AffectedSdes,
    /// Findings referencing those entities
    #[serde(default)]
    pub finding_count: u64,
    /// Optional server explanation
    #[serde(default)]
    pub message: Option<String>,
}

impl ConstraintConflict {
    /// Create conflict detail
    #[inline]
    #[must_use]
    pub fn new(affected_sdes: AffectedSdes, finding_count: u64) -> Self {
        Self {
            affected_sdes,
            finding_count,
            message: None,
        }
    }

    /// Operator-facing explanation
    ///
    /// Always names the finding count and tells the operator to resolve the
    /// findings before retrying.
    #[must_use]
    pub fn user_message(&self) -> String {
        let affected = self.affected_sdes.count().max(1);
        let subject = match self.affected_sdes.names() {
            [] if affected == 1 => "this SDE".to_string(),
            [] => format!("{affected} SDEs"),
            [one] => format!("'{one}'"),
            many => many.iter().map(|n| format!("'{n}'")).collect::<Vec<_>>().join(", "),
        };
        let findings = if self.finding_count == 1 { "finding" } else { "findings" };
        format!(
            "Cannot remove {subject}: {count} {findings} still reference it. \
             Resolve the related findings first, then try again.",
            count = self.finding_count,
        )
    }
}

impl std::fmt::Display for ConstraintConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} findings reference {} SDEs",
            self.finding_count,
            self.affected_sdes.count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_display() {
        let err = SyncError::Server {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "server error (502): bad gateway");
    }

    #[test]
    fn sync_error_is_retryable() {
        assert!(SyncError::Network("refused".to_string()).is_retryable());
        assert!(SyncError::Server { status: 503, message: String::new() }.is_retryable());
        assert!(!SyncError::Server { status: 400, message: String::new() }.is_retryable());
        assert!(!SyncError::Forbidden("no".to_string()).is_retryable());
    }

    #[test]
    fn sync_error_classification() {
        assert!(SyncError::NotFound("gone".to_string()).is_benign());
        assert!(SyncError::Forbidden("no".to_string()).is_terminal());
        assert!(!SyncError::Network("x".to_string()).is_terminal());
    }

    #[test]
    fn constraint_message_names_count_and_findings() {
        let conflict = ConstraintConflict::new(AffectedSdes::Names(vec!["ssn".to_string()]), 3);
        let message = SyncError::ConstraintViolation(conflict).user_message();

        assert!(message.contains('3'));
        assert!(message.contains("findings"));
        assert!(message.contains("'ssn'"));
    }

    #[test]
    fn constraint_message_single_finding_still_mentions_findings() {
        let conflict = ConstraintConflict::new(AffectedSdes::Count(2), 1);
        let message = conflict.user_message();

        assert!(message.starts_with("Cannot remove 2 SDEs: 1 finding"));
        assert!(message.contains("findings first"));
    }

    #[test]
    fn affected_sdes_decodes_both_shapes() {
        let names: AffectedSdes = serde_json::from_str(r#"["email","ssn"]"#).unwrap();
        assert_eq!(names.count(), 2);

        let count: AffectedSdes = serde_json::from_str("4").unwrap();
        assert_eq!(count.count(), 4);
        assert!(count.names().is_empty());
    }

    #[test]
    fn server_message_falls_back_to_raw_text() {
        let err = SyncError::Server {
            status: 500,
            message: "database is locked".to_string(),
        };
        assert_eq!(err.user_message(), "database is locked");

        let empty = SyncError::Server {
            status: 500,
            message: " ".to_string(),
        };
        assert_eq!(empty.user_message(), "Server error (500).");
    }

    #[test]
    fn severity_mapping() {
        let conflict = SyncError::ConstraintViolation(ConstraintConflict::new(AffectedSdes::Count(1), 1));
        assert_eq!(conflict.severity(), Severity::Constraint);
        assert_eq!(SyncError::Network(String::new()).severity(), Severity::Error);
    }
}
