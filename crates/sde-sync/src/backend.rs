//! Backend seam
//!
//! The engine talks to the selection service only through [`SdeBackend`].
//! [`crate::HttpBackend`] is the production implementation; tests script a
//! fake.

use crate::error::SyncError;
use async_trait::async_trait;
use sde_catalog::{ClientId, EntityDefinition, EntityDraft, EntityName, IndustryFilter, SelectionRecord};

/// Remote selection service
#[async_trait]
pub trait SdeBackend: Send + Sync {
    /// Catalogue entries visible under `filter`
    ///
    /// # Errors
    /// Returns error if the request fails or the body is malformed
    async fn fetch_catalog(&self, filter: &IndustryFilter) -> Result<Vec<EntityDefinition>, SyncError>;

    /// Server-side selection for `client`
    ///
    /// # Errors
    /// Returns error if the request fails or the body is malformed
    async fn fetch_persisted(&self, client: &ClientId) -> Result<Vec<SelectionRecord>, SyncError>;

    /// Store `delta`; returns the server's saved count
    ///
    /// # Errors
    /// Returns error if the server rejects the write
    async fn commit_delta(&self, client: &ClientId, delta: &[SelectionRecord]) -> Result<u64, SyncError>;

    /// Remove one saved selection by name
    ///
    /// # Errors
    /// Returns [`SyncError::ConstraintViolation`] when findings reference it,
    /// [`SyncError::NotFound`] when it is already gone
    async fn remove_one(&self, client: &ClientId, name: &EntityName) -> Result<(), SyncError>;

    /// Remove every saved selection; returns the server's cleared count
    ///
    /// # Errors
    /// Returns [`SyncError::ConstraintViolation`] when findings reference any of them
    async fn clear_all(&self, client: &ClientId) -> Result<u64, SyncError>;

    /// Create a catalogue entry
    ///
    /// # Errors
    /// Returns error if the server rejects the entry
    async fn create_entity(&self, draft: &EntityDraft) -> Result<EntityDefinition, SyncError>;
}
