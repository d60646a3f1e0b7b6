//! Error types for catalog values and catalogue entry validation

/// Errors constructing catalog values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Entity name is blank
    #[error("entity name must not be empty")]
    EmptyName,

    /// Client id is blank
    #[error("client id must not be empty")]
    EmptyClientId,

    /// Unknown sensitivity label
    #[error("unknown sensitivity '{0}' (expected Low, Medium or High)")]
    UnknownSensitivity(String),
}

/// Client-side rejection of a new catalogue entry
///
/// These never reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Name is blank
    #[error("entity name is required")]
    EmptyName,

    /// Another entry in the same industry already uses this name
    #[error("an SDE named '{name}' already exists for {industry}")]
    DuplicateName {
        /// Conflicting name as entered
        name: String,
        /// Industry bucket the conflict was found in
        industry: String,
    },

    /// Detection pattern is blank
    #[error("detection pattern is required")]
    EmptyPattern,

    /// Detection pattern does not compile
    #[error("detection pattern is not a valid regular expression: {reason}")]
    InvalidPattern {
        /// Compiler message
        reason: String,
    },
}
