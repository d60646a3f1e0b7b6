//! Warm-start hints
//!
//! The industry filter and the pending selection are cached per client so a
//! restarted session can show the previous state before the first server
//! fetch completes. Hints are never treated as server truth.

use crate::set::SelectionSet;
use crate::store::{KeyValueStore, ScopedKey, StoreError};
use sde_catalog::{ClientId, EntityId, EntityName, IndustryFilter, SelectionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INDUSTRY_KEY: &str = "industry";
const SELECTED_IDS_KEY: &str = "selected_ids";
const SELECTED_RECORDS_KEY: &str = "selected_records";

#[derive(Debug, Serialize, Deserialize)]
struct CachedId {
    id: EntityId,
    name: EntityName,
}

/// Client-scoped view over a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct SelectionHints {
    store: Arc<dyn KeyValueStore>,
    scope: String,
}

impl SelectionHints {
    /// Hints for one client
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, client: &ClientId) -> Self {
        Self {
            store,
            scope: format!("sde:{client}"),
        }
    }

    fn key(&self, name: &str) -> ScopedKey {
        ScopedKey::new(self.scope.clone(), name)
    }

    /// Last industry filter, if cached
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn load_industry(&self) -> Result<Option<IndustryFilter>, StoreError> {
        Ok(self.store.get(&self.key(INDUSTRY_KEY))?.map(IndustryFilter::from))
    }

    /// Cache the industry filter
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub fn save_industry(&self, filter: &IndustryFilter) -> Result<(), StoreError> {
        self.store.set(&self.key(INDUSTRY_KEY), filter.as_query())
    }

    /// Last pending selection, if cached
    ///
    /// # Errors
    /// Returns error if the store cannot be read or holds undecodable data
    pub fn load_selection(&self) -> Result<Option<SelectionSet>, StoreError> {
        let Some(records) = self.store.get(&self.key(SELECTED_RECORDS_KEY))? else {
            return Ok(None);
        };
        let records: Vec<SelectionRecord> = decode(&records)?;
        let mut set = SelectionSet::from_records(records);

        if let Some(ids) = self.store.get(&self.key(SELECTED_IDS_KEY))? {
            let ids: Vec<CachedId> = decode(&ids)?;
            set.restore_ids(ids.into_iter().map(|c| (c.id, c.name)));
        }
        Ok(Some(set))
    }

    /// Cache the pending selection
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub fn save_selection(&self, selection: &SelectionSet) -> Result<(), StoreError> {
        let records = selection.to_records();
        let ids: Vec<CachedId> = selection
            .id_pairs()
            .map(|(id, name)| CachedId {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();

        self.store.set(&self.key(SELECTED_RECORDS_KEY), &encode(&records)?)?;
        self.store.set(&self.key(SELECTED_IDS_KEY), &encode(&ids)?)
    }

    /// Forget the cached selection
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub fn clear_selection(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key(SELECTED_RECORDS_KEY))?;
        self.store.remove(&self.key(SELECTED_IDS_KEY))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Corrupt(e.to_string()))
}
