//! SDE Selection
//!
//! Local selection state and the name-keyed diff against server truth.
//!
//! # Core Concepts
//!
//! - [`SelectionSet`]: pending intent, mutated optimistically on toggle
//! - [`PersistedMirror`]: last known server selection, fetch-generation tagged
//! - [`compute_save_delta`] / [`SavePreview`]: what a save would send
//! - [`KeyValueStore`] / [`SelectionHints`]: warm-start cache behind a trait
//!
//! # Example
//!
//! ```rust
//! use sde_catalog::{EntityDefinition, EntityName, Sensitivity};
//! use sde_selection::{SavePreview, SelectionSet};
//!
//! let mut pending = SelectionSet::new();
//! pending.toggle(&EntityDefinition::new(1, EntityName::new("email").unwrap(), Sensitivity::High));
//!
//! let preview = SavePreview::compute(&pending.to_records(), &[]);
//! assert_eq!(preview.delta().len(), 1);
//! ```

#![warn(unreachable_pub)]

mod diff;
mod hints;
mod mirror;
mod sequence;
mod set;
mod store;

pub use diff::{compute_save_delta, PersistedBasis, SavePreview};
pub use hints::SelectionHints;
pub use mirror::PersistedMirror;
pub use sequence::{FetchSequencer, FetchTicket};
pub use set::{SelectionSet, Toggle};
pub use store::{FileStore, KeyValueStore, MemoryStore, ScopedKey, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
