//! Pending selection set
//!
//! Provides [`SelectionSet`], the user's in-progress intent. Mutation is
//! local and synchronous; nothing here talks to the backend.

use indexmap::IndexMap;
use sde_catalog::{CatalogIndex, EntityDefinition, EntityId, EntityName, SelectionRecord};
use std::collections::BTreeMap;

/// Result of a single toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// Entity became selected
    Added(EntityName),
    /// Entity was deselected
    Removed(EntityName),
}

impl Toggle {
    /// Name the toggle applied to
    #[inline]
    #[must_use]
    pub fn name(&self) -> &EntityName {
        match self {
            Self::Added(name) | Self::Removed(name) => name,
        }
    }

    /// Whether the entity ended up selected
    #[inline]
    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Entity ids plus name-indexed selection records
///
/// Records are authoritative: an entity is selected when its name is
/// present. The id map only tracks which rows of the current catalog batch
/// carry a selected name.
///
/// # Invariants
/// - every id maps to a name present in `records`
/// - at most one record per name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeMap<EntityId, EntityName>,
    records: IndexMap<EntityName, SelectionRecord>,
}

impl SelectionSet {
    /// Empty selection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding the given records, deduplicated by name
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = SelectionRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.records.entry(record.name.clone()).or_insert(record);
        }
        set
    }

    /// Whether the entity's name is selected
    #[inline]
    #[must_use]
    pub fn is_selected(&self, entity: &EntityDefinition) -> bool {
        self.records.contains_key(&entity.name)
    }

    /// Whether a name is selected
    #[inline]
    #[must_use]
    pub fn contains_name(&self, name: &EntityName) -> bool {
        self.records.contains_key(name)
    }

    /// Whether a batch id is marked selected
    #[inline]
    #[must_use]
    pub fn contains_id(&self, id: &EntityId) -> bool {
        self.ids.contains_key(id)
    }

    /// Record for a name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &EntityName) -> Option<&SelectionRecord> {
        self.records.get(name)
    }

    /// Number of selected names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is selected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Selected ids of the current batch
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.ids.keys()
    }

    /// Selected (id, name) pairs
    pub fn id_pairs(&self) -> impl Iterator<Item = (&EntityId, &EntityName)> {
        self.ids.iter()
    }

    /// Selected names in selection order
    pub fn names(&self) -> impl Iterator<Item = &EntityName> {
        self.records.keys()
    }

    /// Selection records in selection order
    pub fn records(&self) -> impl Iterator<Item = &SelectionRecord> {
        self.records.values()
    }

    /// Owned copy of the records, as sent to the diff engine
    #[must_use]
    pub fn to_records(&self) -> Vec<SelectionRecord> {
        self.records.values().cloned().collect()
    }

    /// Flip selection of one entity
    ///
    /// Deselecting drops the record and every id carrying the same name.
    pub fn toggle(&mut self, entity: &EntityDefinition) -> Toggle {
        if self.is_selected(entity) {
            self.remove_name(&entity.name);
            Toggle::Removed(entity.name.clone())
        } else {
            self.insert(entity);
            Toggle::Added(entity.name.clone())
        }
    }

    /// Select every visible entity, keeping selections made under other filters
    ///
    /// Returns the number of names that were newly selected.
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a EntityDefinition>) -> usize {
        visible
            .into_iter()
            .filter(|entity| self.insert(entity))
            .count()
    }

    /// Deselect the visible entities only
    ///
    /// Selections whose names are not visible are left untouched. Returns the
    /// number of names removed.
    pub fn deselect_all_current_tab<'a>(
        &mut self,
        visible: impl IntoIterator<Item = &'a EntityDefinition>,
    ) -> usize {
        visible
            .into_iter()
            .filter(|entity| self.remove_name(&entity.name).is_some())
            .count()
    }

    /// Drop a name and every id carrying it
    pub fn remove_name(&mut self, name: &EntityName) -> Option<SelectionRecord> {
        self.ids.retain(|_, n| n != name);
        self.records.shift_remove(name)
    }

    /// Union with server records
    ///
    /// Names already selected take the server's sensitivity and protection
    /// method. Returns the number of names added.
    pub fn merge_records<'a>(&mut self, records: impl IntoIterator<Item = &'a SelectionRecord>) -> usize {
        let mut added = 0;
        for record in records {
            match self.records.get_mut(&record.name) {
                Some(existing) => *existing = record.clone(),
                None => {
                    self.records.insert(record.name.clone(), record.clone());
                    added += 1;
                }
            }
        }
        added
    }

    /// Re-derive the id map against a fresh catalog batch
    ///
    /// Ids from the previous batch are discarded; selected names visible in
    /// `catalog` are marked under their new ids.
    pub fn attach_catalog(&mut self, catalog: &CatalogIndex) {
        self.ids.clear();
        for entry in catalog {
            if self.records.contains_key(&entry.name) {
                self.ids.insert(entry.id.clone(), entry.name.clone());
            }
        }
    }

    /// Restore cached (id, name) hints for names that are selected
    pub fn restore_ids(&mut self, pairs: impl IntoIterator<Item = (EntityId, EntityName)>) {
        for (id, name) in pairs {
            if self.records.contains_key(&name) {
                self.ids.insert(id, name);
            }
        }
    }

    /// Selected records not visible in the catalog ("different industry")
    pub fn foreign_records<'a>(
        &'a self,
        catalog: &'a CatalogIndex,
    ) -> impl Iterator<Item = &'a SelectionRecord> + 'a {
        self.records
            .values()
            .filter(move |record| !catalog.contains_name(&record.name))
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.ids.clear();
        self.records.clear();
    }

    fn insert(&mut self, entity: &EntityDefinition) -> bool {
        self.ids.insert(entity.id.clone(), entity.name.clone());
        if self.records.contains_key(&entity.name) {
            return false;
        }
        self.records.insert(entity.name.clone(), entity.to_record());
        true
    }
}
