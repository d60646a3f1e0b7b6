//! Entity definitions and selection records
//!
//! [`EntityDefinition`] is what the catalog endpoint returns for one industry
//! bucket. [`SelectionRecord`] is the durable unit a client selects and the
//! server persists.

use crate::error::CatalogError;
use crate::name::{EntityId, EntityName};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Sensitivity tier of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Sensitivity {
    /// Low sensitivity
    #[serde(alias = "low", alias = "LOW")]
    Low,
    /// Medium sensitivity
    #[default]
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    /// High sensitivity
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl Sensitivity {
    /// All tiers, lowest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Label as sent on the wire
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Display for Sensitivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::UnknownSensitivity(s.to_string()))
    }
}

/// Industry filter applied to the catalog
///
/// `All` is the "all industries" bucket of general-purpose entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndustryFilter {
    /// General-purpose entities
    #[default]
    All,
    /// Entities tagged for one industry
    Industry(String),
}

impl IndustryFilter {
    /// Query value for `GET /sdes?industry=`
    #[inline]
    #[must_use]
    pub fn as_query(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Industry(tag) => tag,
        }
    }

    /// Whether an entity tagged `tag` belongs in this bucket
    #[must_use]
    pub fn admits(&self, tag: Option<&str>) -> bool {
        match (self, tag) {
            (Self::All, None) => true,
            (Self::All, Some(tag)) => tag.eq_ignore_ascii_case("all"),
            (Self::Industry(wanted), Some(tag)) => wanted.eq_ignore_ascii_case(tag),
            (Self::Industry(_), None) => false,
        }
    }
}

impl Display for IndustryFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all industries"),
            Self::Industry(tag) => f.write_str(tag),
        }
    }
}

impl From<String> for IndustryFilter {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Industry(trimmed.to_string())
        }
    }
}

impl From<&str> for IndustryFilter {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<IndustryFilter> for String {
    fn from(filter: IndustryFilter) -> Self {
        filter.as_query().to_string()
    }
}

/// Catalog entry as returned by `GET /sdes`
///
/// Immutable once fetched. `id` is only stable within the batch it came in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Batch-local id
    pub id: EntityId,
    /// Durable name
    pub name: EntityName,
    /// Sensitivity tier
    pub sensitivity: Sensitivity,
    /// Classification label (PII, PHI, PCI, ...)
    #[serde(default)]
    pub classification: String,
    /// Data type hint (string, number, ...)
    #[serde(default)]
    pub data_type: String,
    /// Industry this entity is tagged for, `None` for general-purpose
    #[serde(default, alias = "industry")]
    pub industry_tag: Option<String>,
    /// Pattern the scanner uses to detect this entity
    #[serde(default)]
    pub detection_pattern: String,
}

impl EntityDefinition {
    /// Create a definition with empty descriptive fields
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: EntityName, sensitivity: Sensitivity) -> Self {
        Self {
            id: id.into(),
            name,
            sensitivity,
            classification: String::new(),
            data_type: String::new(),
            industry_tag: None,
            detection_pattern: String::new(),
        }
    }

    /// With industry tag
    #[inline]
    #[must_use]
    pub fn with_industry(mut self, tag: impl Into<String>) -> Self {
        self.industry_tag = Some(tag.into());
        self
    }

    /// With classification label
    #[inline]
    #[must_use]
    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = classification.into();
        self
    }

    /// With detection pattern
    #[inline]
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.detection_pattern = pattern.into();
        self
    }

    /// Selection record for this entity, with no protection method
    #[inline]
    #[must_use]
    pub fn to_record(&self) -> SelectionRecord {
        SelectionRecord::new(self.name.clone(), self.sensitivity)
    }
}

/// A selected entity, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Durable name
    pub name: EntityName,
    /// Sensitivity at the time of selection
    pub sensitivity: Sensitivity,
    /// Protection applied by the scanner (masking, tokenization, ...)
    #[serde(default)]
    pub protection_method: Option<String>,
}

impl SelectionRecord {
    /// Create record without a protection method
    #[inline]
    #[must_use]
    pub fn new(name: EntityName, sensitivity: Sensitivity) -> Self {
        Self {
            name,
            sensitivity,
            protection_method: None,
        }
    }

    /// With protection method
    #[inline]
    #[must_use]
    pub fn with_protection(mut self, method: impl Into<String>) -> Self {
        self.protection_method = Some(method.into());
        self
    }

    /// Same name and sensitivity, ignoring protection method
    #[inline]
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        self.name == other.name && self.sensitivity == other.sensitivity
    }
}
