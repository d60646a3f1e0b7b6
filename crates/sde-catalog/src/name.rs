//! Identifier newtypes
//!
//! [`EntityName`] is the durable identity of an entity across catalog
//! fetches. [`EntityId`] is only meaningful inside one fetch batch and must
//! never be used to compare selections.

use crate::error::CatalogError;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Durable, name-based identity of a Sensitive Data Entity
///
/// Names are unique within a client. All diffing, deduplication and removal
/// is keyed on this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Create a name, rejecting blank input
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns [`CatalogError::EmptyName`] if the name is blank
    pub fn new(name: impl Into<String>) -> Result<Self, CatalogError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Name as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, used for catalogue duplicate checks
    #[inline]
    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for EntityName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityName {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Batch-local entity identifier
///
/// The backend may send numeric or string ids; both are stored as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create id from any displayable value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Client (tenant) whose selection is being curated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Create a client id, rejecting blank input
    ///
    /// # Errors
    /// Returns [`CatalogError::EmptyClientId`] if the id is blank
    pub fn new(id: impl Into<String>) -> Result<Self, CatalogError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CatalogError::EmptyClientId);
        }
        Ok(Self(id.trim().to_string()))
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientId {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_name_trims_and_rejects_blank() {
        let name = EntityName::new("  email ").unwrap();
        assert_eq!(name.as_str(), "email");

        assert!(matches!(EntityName::new("   "), Err(CatalogError::EmptyName)));
        assert!(matches!("".parse::<EntityName>(), Err(CatalogError::EmptyName)));
    }

    #[test]
    fn entity_name_case_insensitive_compare() {
        let name = EntityName::new("Credit Card").unwrap();
        assert!(name.eq_ignore_case("credit card"));
        assert!(!name.eq_ignore_case("credit-card"));
    }

    #[test]
    fn entity_name_serde_is_plain_string() {
        let name = EntityName::new("ssn").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"ssn\"");

        let blank: Result<EntityName, _> = serde_json::from_str("\"  \"");
        assert!(blank.is_err());
    }

    #[test]
    fn entity_id_accepts_numbers_and_strings() {
        let numeric: EntityId = serde_json::from_str("42").unwrap();
        let text: EntityId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(numeric, text);
        assert_eq!(numeric, EntityId::from(42));
    }

    #[test]
    fn client_id_rejects_blank() {
        assert!(ClientId::new("").is_err());
        assert_eq!(ClientId::new(" acme ").unwrap().as_str(), "acme");
    }
}
