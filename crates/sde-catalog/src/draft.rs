//! New catalogue entries
//!
//! An [`EntityDraft`] is validated against the loaded catalog before it is
//! submitted. Rejections are [`ValidationError`]s and never reach the server.

use crate::entity::{IndustryFilter, Sensitivity};
use crate::error::ValidationError;
use crate::index::CatalogIndex;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Operator-entered catalogue entry, body of `POST /sdes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDraft {
    /// Proposed name
    pub name: String,
    /// Sensitivity tier
    pub sensitivity: Sensitivity,
    /// Classification label
    #[serde(default)]
    pub classification: String,
    /// Data type hint
    #[serde(default)]
    pub data_type: String,
    /// Target industry, `None` for general-purpose
    #[serde(default)]
    pub industry_tag: Option<String>,
    /// Regular expression the scanner will match
    pub detection_pattern: String,
}

impl EntityDraft {
    /// Create draft with empty descriptive fields
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sensitivity: Sensitivity,
        detection_pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sensitivity,
            classification: String::new(),
            data_type: String::new(),
            industry_tag: None,
            detection_pattern: detection_pattern.into(),
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

    /// Industry bucket the draft lands in
    #[must_use]
    pub fn bucket(&self) -> IndustryFilter {
        IndustryFilter::from(self.industry_tag.clone().unwrap_or_default())
    }

    /// Check name and pattern without looking at the catalog
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyName`], [`ValidationError::EmptyPattern`]
    /// or [`ValidationError::InvalidPattern`]
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let pattern = self.detection_pattern.trim();
        if pattern.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Check the draft against `catalog`
    ///
    /// Names are compared case-insensitively within the draft's industry;
    /// `catalog` must hold that industry's entries for the check to be
    /// complete.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found
    pub fn validate(&self, catalog: &CatalogIndex) -> Result<(), ValidationError> {
        self.validate_fields()?;

        let name = self.name.trim();
        let bucket = self.bucket();
        let duplicate = catalog
            .iter()
            .filter(|entry| bucket.admits(entry.industry_tag.as_deref()))
            .any(|entry| entry.name.eq_ignore_case(name));
        if duplicate {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                industry: bucket.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDefinition;
    use crate::name::EntityName;

    fn catalog() -> CatalogIndex {
        CatalogIndex::new(
            IndustryFilter::from("healthcare"),
            vec![
                EntityDefinition::new(1, EntityName::new("Patient ID").unwrap(), Sensitivity::High)
                    .with_industry("healthcare"),
                EntityDefinition::new(2, EntityName::new("email").unwrap(), Sensitivity::Medium),
            ],
        )
    }

    #[test]
    fn valid_draft_passes() {
        let draft = EntityDraft::new("MRN", Sensitivity::High, r"MRN-\d{6}").with_industry("healthcare");
        assert!(draft.validate(&catalog()).is_ok());
    }

    #[test]
    fn duplicate_within_industry_rejected() {
        let draft =
            EntityDraft::new("patient id", Sensitivity::High, r"\d+").with_industry("Healthcare");
        let err = draft.validate(&catalog()).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateName { .. }));
    }

    #[test]
    fn same_name_in_other_industry_allowed() {
        let draft = EntityDraft::new("Patient ID", Sensitivity::Low, r"\d+").with_industry("finance");
        assert!(draft.validate(&catalog()).is_ok());
    }

    #[test]
    fn general_purpose_duplicate_rejected() {
        let draft = EntityDraft::new("EMAIL", Sensitivity::Low, r"\S+@\S+");
        assert!(matches!(
            draft.validate(&catalog()),
            Err(ValidationError::DuplicateName { .. })
        ));
    }

    #[test]
    fn blank_fields_rejected() {
        let cat = catalog();
        assert_eq!(
            EntityDraft::new("  ", Sensitivity::Low, "x").validate(&cat),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            EntityDraft::new("token", Sensitivity::Low, " ").validate(&cat),
            Err(ValidationError::EmptyPattern)
        );
    }

    #[test]
    fn field_check_ignores_catalog() {
        let draft = EntityDraft::new("EMAIL", Sensitivity::Low, r"\S+@\S+");
        assert!(draft.validate_fields().is_ok());
        assert_eq!(
            EntityDraft::new("EMAIL", Sensitivity::Low, "").validate_fields(),
            Err(ValidationError::EmptyPattern)
        );
    }

    #[test]
    fn invalid_regex_rejected() {
        let draft = EntityDraft::new("token", Sensitivity::Low, "([a-z]+");
        assert!(matches!(
            draft.validate(&catalog()),
            Err(ValidationError::InvalidPattern { .. })
        ));
    }
}
