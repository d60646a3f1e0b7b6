//! SDE Catalog
//!
//! Domain values for the Sensitive Data Entity catalogue.
//!
//! # Core Concepts
//!
//! - [`EntityDefinition`]: a catalog row, scoped to one industry fetch
//! - [`SelectionRecord`]: the durable unit of selection, keyed by [`EntityName`]
//! - [`CatalogIndex`]: the rows visible under the current [`IndustryFilter`]
//! - [`EntityDraft`]: a new catalogue entry, validated before submission
//!
//! Identity across fetches is always by name. Ids are regenerated per fetch
//! and are only used to address rows inside the batch they arrived in.
//!
//! # Example
//!
//! ```rust
//! use sde_catalog::{CatalogIndex, EntityDefinition, EntityName, IndustryFilter, Sensitivity};
//!
//! let email = EntityDefinition::new(1, EntityName::new("email").unwrap(), Sensitivity::High);
//! let index = CatalogIndex::new(IndustryFilter::All, vec![email]);
//!
//! let record = index.iter().next().unwrap().to_record();
//! assert_eq!(record.name.as_str(), "email");
//! ```

#![warn(unreachable_pub)]

mod draft;
mod entity;
mod error;
mod index;
mod name;

pub use draft::EntityDraft;
pub use entity::{EntityDefinition, IndustryFilter, SelectionRecord, Sensitivity};
pub use error::{CatalogError, ValidationError};
pub use index::CatalogIndex;
pub use name::{ClientId, EntityId, EntityName};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
