//! Catalog index for the active industry filter
//!
//! Provides [`CatalogIndex`]: the read-only set of entity definitions from
//! the latest catalog fetch, indexed by batch id and by name.

use crate::entity::{EntityDefinition, IndustryFilter};
use crate::name::{EntityId, EntityName};
use std::collections::HashMap;

/// Entity definitions visible under one industry filter
///
/// Replaced wholesale on every filter change. Lookups by id are valid only
/// against this batch; lookups by name are how selections made under other
/// filters are matched back to visible rows.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    filter: IndustryFilter,
    entries: Vec<EntityDefinition>,
    by_id: HashMap<EntityId, usize>,
    by_name: HashMap<EntityName, usize>,
}

impl CatalogIndex {
    /// Build index from a fetch batch
    ///
    /// Entries repeating an id already seen in the batch are dropped. When
    /// names repeat, name lookup resolves to the first entry.
    #[must_use]
    pub fn new(filter: IndustryFilter, entries: Vec<EntityDefinition>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());

        for entry in entries {
            if by_id.contains_key(&entry.id) {
                tracing::warn!(id = %entry.id, name = %entry.name, "duplicate entity id in catalog batch");
                continue;
            }
            let pos = kept.len();
            by_id.insert(entry.id.clone(), pos);
            by_name.entry(entry.name.clone()).or_insert(pos);
            kept.push(entry);
        }

        Self {
            filter,
            entries: kept,
            by_id,
            by_name,
        }
    }

    /// Empty index for a filter
    #[inline]
    #[must_use]
    pub fn empty(filter: IndustryFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Filter this batch was fetched for
    #[inline]
    #[must_use]
    pub fn filter(&self) -> &IndustryFilter {
        &self.filter
    }

    /// Entries in fetch order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[EntityDefinition] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up by batch id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&EntityDefinition> {
        self.by_id.get(id).map(|&pos| &self.entries[pos])
    }

    /// Look up by durable name
    #[inline]
    #[must_use]
    pub fn find_by_name(&self, name: &EntityName) -> Option<&EntityDefinition> {
        self.by_name.get(name).map(|&pos| &self.entries[pos])
    }

    /// Whether a name is visible under this filter
    #[inline]
    #[must_use]
    pub fn contains_name(&self, name: &EntityName) -> bool {
        self.by_name.contains_key(name)
    }

    /// Every id of entries carrying `name`
    pub fn ids_for_name<'a>(&'a self, name: &'a EntityName) -> impl Iterator<Item = &'a EntityId> + 'a {
        self.entries
            .iter()
            .filter(move |e| &e.name == name)
            .map(|e| &e.id)
    }

    /// Iterate entries
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, EntityDefinition> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a CatalogIndex {
    type Item = &'a EntityDefinition;
    type IntoIter = std::slice::Iter<'a, EntityDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Sensitivity;

    fn def(id: u64, name: &str) -> EntityDefinition {
        EntityDefinition::new(id, EntityName::new(name).unwrap(), Sensitivity::Medium)
    }

    #[test]
    fn index_lookups() {
        let index = CatalogIndex::new(IndustryFilter::All, vec![def(1, "email"), def(2, "ssn")]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&EntityId::from(2)).unwrap().name.as_str(), "ssn");
        assert!(index.contains_name(&EntityName::new("email").unwrap()));
        assert!(index.get(&EntityId::from(3)).is_none());
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let index = CatalogIndex::new(IndustryFilter::All, vec![def(1, "email"), def(1, "phone")]);

        assert_eq!(index.len(), 1);
        assert!(!index.contains_name(&EntityName::new("phone").unwrap()));
    }

    #[test]
    fn repeated_names_resolve_to_first() {
        let index = CatalogIndex::new(IndustryFilter::All, vec![def(1, "email"), def(2, "email")]);
        let name = EntityName::new("email").unwrap();

        assert_eq!(index.find_by_name(&name).unwrap().id, EntityId::from(1));
        assert_eq!(index.ids_for_name(&name).count(), 2);
    }

    #[test]
    fn empty_index_keeps_filter() {
        let index = CatalogIndex::empty(IndustryFilter::from("finance"));
        assert!(index.is_empty());
        assert_eq!(index.filter().as_query(), "finance");
    }
}
