//! SDE Sync
//!
//! Reconciles the operator's pending selection of sensitive data entities
//! with the selection stored on the backend.
//!
//! # Core Concepts
//!
//! - [`ReconciliationEngine`]: owns catalog, pending and persisted views
//! - [`SdeBackend`]: the only way the engine reaches the service
//! - [`ActionPhase`]: preview, confirm, commit lifecycle for destructive writes
//! - [`FeedbackChannel`]: single-slot operator notices
//!
//! # Example
//!
//! ```rust,no_run
//! use sde_catalog::IndustryFilter;
//! use sde_sync::{EngineConfig, HttpBackend, ReconciliationEngine};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::new().with_client_id("acme");
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let engine = ReconciliationEngine::from_config(&config, backend)?;
//!
//! engine.load_catalog(IndustryFilter::All).await?;
//! engine.refresh_persisted().await?;
//! let preview = engine.preview_save().await?;
//! println!("{}", preview.summary());
//! engine.confirm().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod action;
mod backend;
mod config;
mod debounce;
mod engine;
mod error;
mod feedback;
mod http;

pub use action::{allowed_transitions, validate_transition, ActionPhase, ActionPreview, PendingAction};
pub use backend::SdeBackend;
pub use config::{ConfigError, EngineConfig, FeedbackConfig, ENV_BASE_URL, ENV_CLIENT_ID};
pub use debounce::Debouncer;
pub use engine::{
    CatalogRow, CommitOutcome, EngineSnapshot, FetchOutcome, PendingRow, ReconciliationEngine,
};
pub use error::{AffectedSdes, ConstraintConflict, SyncError};
pub use feedback::{FeedbackChannel, Notice, Severity};
pub use http::HttpBackend;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
