//! Reconciliation engine
//!
//! Owns the three views of the selection (catalog batch, pending intent and
//! persisted mirror) and drives every read and write against the backend.
//!
//! The state lock is never held across an `.await`: each operation takes a
//! snapshot, releases the lock for I/O, then applies the result in one
//! critical section so readers never observe a half-applied change.

use crate::action::{ActionPhase, ActionPreview, PendingAction};
use crate::backend::SdeBackend;
use crate::config::{ConfigError, EngineConfig, FeedbackConfig};
use crate::debounce::Debouncer;
use crate::error::SyncError;
use crate::feedback::{FeedbackChannel, Severity};
use parking_lot::Mutex;
use sde_catalog::{
    CatalogIndex, ClientId, EntityDefinition, EntityDraft, EntityId, EntityName, IndustryFilter,
    SelectionRecord,
};
use sde_selection::{
    FetchSequencer, FetchTicket, FileStore, PersistedMirror, SavePreview, SelectionHints, SelectionSet, Toggle,
};
use std::sync::Arc;
use std::time::Duration;

/// Result of a catalog or persisted-selection fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Response applied; number of entries now held
    Applied(usize),
    /// A newer fetch was issued before this one returned
    Discarded,
    /// Superseded by a later call inside the debounce window
    Coalesced,
}

/// Result of a confirmed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Delta stored
    Saved {
        /// Count reported by the server
        saved_count: u64,
        /// Saved selections after the refresh
        persisted: usize,
    },
    /// Delta was empty; nothing was sent
    NothingToSave,
    /// Selection removed
    Removed(EntityName),
    /// Selection was already gone server-side
    AlreadyRemoved(EntityName),
    /// Every saved selection removed
    Cleared {
        /// Count reported by the server
        cleared_count: u64,
    },
}

/// Catalog row as rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    /// Entry
    pub entity: EntityDefinition,
    /// In pending selection
    pub selected: bool,
    /// In persisted mirror
    pub saved: bool,
}

/// Pending selection row as rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRow {
    /// Selection
    pub record: SelectionRecord,
    /// In persisted mirror
    pub saved: bool,
    /// Not part of the current catalog batch
    pub outside_filter: bool,
}

/// Consistent read of the whole engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Active industry filter
    pub filter: IndustryFilter,
    /// Current catalog batch
    pub rows: Vec<CatalogRow>,
    /// Pending selection, insertion ordered
    pub pending: Vec<PendingRow>,
    /// Persisted mirror
    pub persisted: Vec<SelectionRecord>,
    /// Whether the mirror has been fetched at least once
    pub persisted_loaded: bool,
    /// Destructive-action phase
    pub phase: ActionPhase,
    /// What is awaiting confirmation
    pub preview: Option<ActionPreview>,
    /// A submit is in flight
    pub busy: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    catalog: CatalogIndex,
    catalog_seq: FetchSequencer,
    pending: SelectionSet,
    mirror: PersistedMirror,
    action: Option<PendingAction>,
    busy: bool,
}

impl EngineState {
    /// Replace any open preview with a new one
    fn open_action(&mut self, preview: ActionPreview) -> Result<(), SyncError> {
        if let Some(action) = self.action.as_mut() {
            if action.phase().is_in_flight() {
                return Err(SyncError::Busy);
            }
            action.advance_through(&[ActionPhase::Cancelled, ActionPhase::Idle])?;
        }
        tracing::debug!(action = preview.label(), "preview opened");
        self.action = Some(PendingAction::open(preview));
        Ok(())
    }

    fn phase(&self) -> ActionPhase {
        self.action.as_ref().map_or(ActionPhase::Idle, PendingAction::phase)
    }
}

/// Clears the busy flag when the submit that set it ends, however it ends
struct BusyGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.busy = false;
        if let Some(action) = state.action.as_mut() {
            if action.phase() == ActionPhase::Committing {
                tracing::warn!(action = action.preview().label(), "commit abandoned before completion");
                let _ = action.advance_through(&[ActionPhase::Failed, ActionPhase::Previewing]);
            }
        }
    }
}

/// Local mutation produced by a successful commit
enum Committed {
    Saved {
        saved_count: u64,
        delta: Vec<SelectionRecord>,
        refreshed: Option<(FetchTicket, Vec<SelectionRecord>)>,
    },
    Removed(EntityName),
    AlreadyRemoved(EntityName),
    Cleared(u64),
}

/// Selection reconciliation engine
pub struct ReconciliationEngine {
    client: ClientId,
    backend: Arc<dyn SdeBackend>,
    feedback: FeedbackChannel,
    hints: Option<SelectionHints>,
    debouncer: Debouncer,
    state: Mutex<EngineState>,
}

impl ReconciliationEngine {
    /// Create engine for `client` with default feedback and debounce settings
    #[must_use]
    pub fn new(client: ClientId, backend: Arc<dyn SdeBackend>) -> Self {
        let defaults = EngineConfig::default();
        Self {
            client,
            backend,
            feedback: FeedbackChannel::new(defaults.feedback),
            hints: None,
            debouncer: Debouncer::new(defaults.debounce()),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Create engine from validated config, opening the hint file if set
    ///
    /// # Errors
    /// Returns error if the config is invalid or the hint file is corrupt
    pub fn from_config(config: &EngineConfig, backend: Arc<dyn SdeBackend>) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = config.client()?;
        let hints = match &config.hints_path {
            Some(path) => Some(SelectionHints::new(Arc::new(FileStore::open(path)?), &client)),
            None => None,
        };
        let mut engine = Self::new(client, backend)
            .with_feedback_config(config.feedback)
            .with_debounce(config.debounce());
        engine.hints = hints;
        Ok(engine)
    }

    /// With notice durations
    #[must_use]
    pub fn with_feedback_config(mut self, config: FeedbackConfig) -> Self {
        self.feedback = FeedbackChannel::new(config);
        self
    }

    /// With industry-switch debounce window
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debouncer = Debouncer::new(window);
        self
    }

    /// With warm-start hints
    #[must_use]
    pub fn with_hints(mut self, hints: SelectionHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Client being managed
    #[inline]
    #[must_use]
    pub fn client(&self) -> &ClientId {
        &self.client
    }

    /// Notice channel
    #[inline]
    #[must_use]
    pub fn feedback(&self) -> &FeedbackChannel {
        &self.feedback
    }

    /// Consistent copy of the whole state
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock();
        let rows = state
            .catalog
            .iter()
            .map(|entity| CatalogRow {
                entity: entity.clone(),
                selected: state.pending.is_selected(entity),
                saved: state.mirror.contains(&entity.name),
            })
            .collect();
        let pending = state
            .pending
            .records()
            .map(|record| PendingRow {
                record: record.clone(),
                saved: state.mirror.contains(&record.name),
                outside_filter: !state.catalog.contains_name(&record.name),
            })
            .collect();

        EngineSnapshot {
            filter: state.catalog.filter().clone(),
            rows,
            pending,
            persisted: state.mirror.records().to_vec(),
            persisted_loaded: state.mirror.is_loaded(),
            phase: state.phase(),
            preview: state.action.as_ref().map(|a| a.preview().clone()),
            busy: state.busy,
        }
    }

    /// Restore cached filter and selection before the first fetch
    ///
    /// Returns the cached industry filter; store failures are logged and
    /// ignored.
    pub fn warm_start(&self) -> Option<IndustryFilter> {
        let hints = self.hints.as_ref()?;
        let industry = hints.load_industry().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable industry hint");
            None
        });
        let selection = hints.load_selection().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable selection hint");
            None
        });

        let mut state = self.state.lock();
        if let Some(filter) = &industry {
            state.catalog = CatalogIndex::empty(filter.clone());
        }
        if let Some(selection) = selection {
            tracing::info!(client = %self.client, selected = selection.len(), "restored cached selection");
            state.pending = selection;
        }
        industry
    }

    /// Fetch the catalog for `filter` and make it current
    ///
    /// Responses older than the latest issued fetch are discarded.
    ///
    /// # Errors
    /// Returns the backend error; the previous catalog stays current
    pub async fn load_catalog(&self, filter: IndustryFilter) -> Result<FetchOutcome, SyncError> {
        let ticket = self.state.lock().catalog_seq.issue();
        let fetched = self.backend.fetch_catalog(&filter).await;

        let entries = match fetched {
            Ok(entries) => entries,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        let selection = {
            let mut state = self.state.lock();
            if !state.catalog_seq.accept(ticket) {
                tracing::warn!(%filter, %ticket, "discarding stale catalog response");
                return Ok(FetchOutcome::Discarded);
            }
            let catalog = CatalogIndex::new(filter.clone(), entries);
            state.pending.attach_catalog(&catalog);
            state.catalog = catalog;
            tracing::info!(%filter, entries = state.catalog.len(), "catalog loaded");
            (state.catalog.len(), state.pending.clone())
        };

        if let Some(hints) = &self.hints {
            if let Err(e) = hints.save_industry(&filter) {
                tracing::warn!(error = %e, "failed to cache industry filter");
            }
        }
        self.save_selection_hint(&selection.1);
        Ok(FetchOutcome::Applied(selection.0))
    }

    /// Debounced [`Self::load_catalog`] for rapid filter switches
    ///
    /// Only the last call within the debounce window fetches; earlier calls
    /// return [`FetchOutcome::Coalesced`].
    ///
    /// # Errors
    /// Returns the backend error of the fetch that ran
    pub async fn change_industry(&self, filter: IndustryFilter) -> Result<FetchOutcome, SyncError> {
        if !self.debouncer.settle().await {
            tracing::debug!(%filter, "industry switch coalesced");
            return Ok(FetchOutcome::Coalesced);
        }
        self.load_catalog(filter).await
    }

    /// Fetch the server selection and fold it into the pending selection
    ///
    /// # Errors
    /// Returns the backend error; the mirror is unchanged
    pub async fn refresh_persisted(&self) -> Result<FetchOutcome, SyncError> {
        let ticket = self.state.lock().mirror.begin_fetch();
        let fetched = self.backend.fetch_persisted(&self.client).await;

        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        let selection = {
            let mut state = self.state.lock();
            if !state.mirror.apply_fetch(ticket, records) {
                return Ok(FetchOutcome::Discarded);
            }
            let EngineState { pending, mirror, catalog, .. } = &mut *state;
            pending.merge_records(mirror.records());
            pending.attach_catalog(catalog);
            tracing::info!(client = %self.client, saved = mirror.len(), "persisted selection loaded");
            (mirror.len(), pending.clone())
        };
        self.save_selection_hint(&selection.1);
        Ok(FetchOutcome::Applied(selection.0))
    }

    /// Flip one catalog entry in the pending selection
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownEntity`] if `id` is not in the current batch
    pub fn toggle(&self, id: &EntityId) -> Result<Toggle, SyncError> {
        let (toggle, selection) = {
            let mut state = self.state.lock();
            let entity = state
                .catalog
                .get(id)
                .cloned()
                .ok_or_else(|| SyncError::UnknownEntity(id.clone()))?;
            let toggle = state.pending.toggle(&entity);
            (toggle, state.pending.clone())
        };

        let message = match &toggle {
            Toggle::Added(name) => format!("Added {name}"),
            Toggle::Removed(name) => format!("Removed {name}"),
        };
        self.feedback.notify_with(Severity::Routine, message);
        self.save_selection_hint(&selection);
        Ok(toggle)
    }

    /// Drop a pending selection by name, including ones outside the current batch
    pub fn unselect(&self, name: &EntityName) -> bool {
        let (removed, selection) = {
            let mut state = self.state.lock();
            let removed = state.pending.remove_name(name).is_some();
            (removed, state.pending.clone())
        };
        if removed {
            self.feedback.notify_with(Severity::Routine, format!("Removed {name}"));
            self.save_selection_hint(&selection);
        }
        removed
    }

    /// Select every entry of the current batch; returns how many were added
    pub fn select_all_visible(&self) -> usize {
        let (added, selection) = {
            let mut state = self.state.lock();
            let EngineState { pending, catalog, .. } = &mut *state;
            let added = pending.select_all(catalog.iter());
            (added, pending.clone())
        };
        self.feedback
            .notify_with(Severity::Routine, format!("Selected {}", sdes(added as u64)));
        self.save_selection_hint(&selection);
        added
    }

    /// Deselect every entry of the current batch; selections elsewhere stay
    pub fn deselect_all_visible(&self) -> usize {
        let (removed, selection) = {
            let mut state = self.state.lock();
            let EngineState { pending, catalog, .. } = &mut *state;
            let removed = pending.deselect_all_current_tab(catalog.iter());
            (removed, pending.clone())
        };
        self.feedback
            .notify_with(Severity::Routine, format!("Deselected {}", sdes(removed as u64)));
        self.save_selection_hint(&selection);
        removed
    }

    /// Fetch fresh server state and open a save preview
    ///
    /// If the fetch fails the preview fails open: every pending selection is
    /// offered and the server deduplicates.
    ///
    /// # Errors
    /// Returns [`SyncError::Busy`] while another submit is in flight
    pub async fn preview_save(&self) -> Result<SavePreview, SyncError> {
        let _guard = self.acquire()?;
        let ticket = self.state.lock().mirror.begin_fetch();
        let fetched = self.backend.fetch_persisted(&self.client).await;

        let preview = {
            let mut state = self.state.lock();
            let pending = state.pending.to_records();
            let preview = match fetched {
                Ok(records) => {
                    if !state.mirror.apply_fetch(ticket, records) {
                        tracing::debug!(%ticket, "preview fetch superseded; diffing against newer mirror");
                    }
                    SavePreview::compute(&pending, state.mirror.records())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "saved selection check failed; preview fails open");
                    SavePreview::fail_open(&pending, e.user_message())
                }
            };
            state.open_action(ActionPreview::Save(preview.clone()))?;
            preview
        };

        if preview.is_up_to_date() {
            let severity = if preview.is_fail_open() { Severity::Routine } else { Severity::Success };
            self.feedback.notify_with(severity, preview.summary());
        } else if preview.is_fail_open() {
            self.feedback.notify_with(
                Severity::Warning,
                "Could not check saved SDEs; all selected SDEs will be sent",
            );
        }
        Ok(preview)
    }

    /// Open a removal preview for one saved selection
    ///
    /// # Errors
    /// Returns [`SyncError::Busy`] while another submit is in flight
    pub fn preview_remove(&self, name: EntityName) -> Result<ActionPreview, SyncError> {
        let mut state = self.state.lock();
        if state.busy {
            return Err(SyncError::Busy);
        }
        let persisted = state.mirror.contains(&name);
        let preview = ActionPreview::RemoveOne { name, persisted };
        state.open_action(preview.clone())?;
        Ok(preview)
    }

    /// Open a preview for removing every saved selection
    ///
    /// # Errors
    /// Returns [`SyncError::Busy`] while another submit is in flight
    pub fn preview_clear_all(&self) -> Result<ActionPreview, SyncError> {
        let mut state = self.state.lock();
        if state.busy {
            return Err(SyncError::Busy);
        }
        let preview = ActionPreview::ClearAll {
            count: state.mirror.len(),
        };
        state.open_action(preview.clone())?;
        Ok(preview)
    }

    /// Dismiss the open preview
    ///
    /// # Errors
    /// Returns [`SyncError::NothingToConfirm`] without an open preview
    pub fn cancel(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        let action = state.action.as_mut().ok_or(SyncError::NothingToConfirm)?;
        action.advance_through(&[ActionPhase::Cancelled, ActionPhase::Idle])?;
        state.action = None;
        Ok(())
    }

    /// Execute the open preview
    ///
    /// Local state changes only after the server accepts. On failure the
    /// preview stays open so the operator can retry or cancel.
    ///
    /// # Errors
    /// Returns [`SyncError::Busy`] while another submit is in flight,
    /// [`SyncError::NothingToConfirm`] without a preview, or the backend error
    pub async fn confirm(&self) -> Result<CommitOutcome, SyncError> {
        let _guard = self.acquire()?;

        let preview = {
            let mut state = self.state.lock();
            let action = state.action.as_mut().ok_or(SyncError::NothingToConfirm)?;
            let empty_save = match action.preview() {
                ActionPreview::Save(save) if save.is_up_to_date() => Some(save.clone()),
                _ => None,
            };
            if let Some(save) = empty_save {
                action.advance_through(&[ActionPhase::Cancelled, ActionPhase::Idle])?;
                state.action = None;
                Err(save)
            } else {
                action.advance_through(&[ActionPhase::Confirmed, ActionPhase::Committing])?;
                Ok(action.preview().clone())
            }
        };

        let preview = match preview {
            Ok(preview) => preview,
            Err(save) => {
                let severity = if save.is_fail_open() { Severity::Routine } else { Severity::Success };
                self.feedback.notify_with(severity, save.summary());
                return Ok(CommitOutcome::NothingToSave);
            }
        };

        let result = match &preview {
            ActionPreview::Save(save) => self.commit_save(save.delta()).await,
            ActionPreview::RemoveOne { name, .. } => self.commit_remove(name).await,
            ActionPreview::ClearAll { .. } => self.commit_clear().await,
        };

        match result {
            Ok(committed) => {
                let (outcome, selection) = {
                    let mut state = self.state.lock();
                    let outcome = apply_committed(&mut state, committed);
                    if let Some(action) = state.action.as_mut() {
                        action.advance_through(&[ActionPhase::Succeeded, ActionPhase::Idle])?;
                    }
                    state.action = None;
                    (outcome, state.pending.clone())
                };
                self.announce(&outcome);
                self.save_selection_hint(&selection);
                Ok(outcome)
            }
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    if let Some(action) = state.action.as_mut() {
                        action.advance_through(&[ActionPhase::Failed, ActionPhase::Previewing])?;
                    }
                }
                tracing::warn!(action = preview.label(), error = %e, "commit failed");
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Validate and create a catalogue entry
    ///
    /// Invalid drafts are rejected before any request is sent. Duplicate
    /// names are checked against the draft's own industry; if that is not the
    /// loaded catalog it is fetched first, without replacing the loaded one.
    ///
    /// # Errors
    /// Returns [`SyncError::Validation`] for invalid drafts, or the backend error
    pub async fn create_entity(&self, draft: EntityDraft) -> Result<EntityDefinition, SyncError> {
        if let Err(e) = draft.validate_fields() {
            let err = SyncError::from(e);
            self.report(&err);
            return Err(err);
        }

        let bucket = draft.bucket();
        let loaded = {
            let state = self.state.lock();
            let covers = state.catalog_seq.last_applied() > 0
                && state.catalog.filter().as_query().eq_ignore_ascii_case(bucket.as_query());
            covers.then(|| state.catalog.clone())
        };
        let catalog = match loaded {
            Some(catalog) => catalog,
            None => {
                tracing::debug!(industry = %bucket, "fetching target industry to check for duplicates");
                match self.backend.fetch_catalog(&bucket).await {
                    Ok(entries) => CatalogIndex::new(bucket, entries),
                    Err(e) => {
                        self.report(&e);
                        return Err(e);
                    }
                }
            }
        };
        if let Err(e) = draft.validate(&catalog) {
            let err = SyncError::from(e);
            self.report(&err);
            return Err(err);
        }

        let _guard = self.acquire()?;
        let created = match self.backend.create_entity(&draft).await {
            Ok(created) => created,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        {
            let mut state = self.state.lock();
            if state.catalog.filter().admits(created.industry_tag.as_deref()) {
                let mut entries = state.catalog.entries().to_vec();
                entries.push(created.clone());
                let catalog = CatalogIndex::new(state.catalog.filter().clone(), entries);
                state.pending.attach_catalog(&catalog);
                state.catalog = catalog;
            }
        }
        self.feedback
            .notify_with(Severity::Success, format!("Added {} to the catalogue", created.name));
        Ok(created)
    }

    async fn commit_save(&self, delta: &[SelectionRecord]) -> Result<Committed, SyncError> {
        let saved_count = self.backend.commit_delta(&self.client, delta).await?;

        let ticket = self.state.lock().mirror.begin_fetch();
        let refreshed = match self.backend.fetch_persisted(&self.client).await {
            Ok(records) => Some((ticket, records)),
            Err(e) => {
                tracing::warn!(error = %e, "refresh after save failed; applying delta locally");
                None
            }
        };
        Ok(Committed::Saved {
            saved_count,
            delta: delta.to_vec(),
            refreshed,
        })
    }

    async fn commit_remove(&self, name: &EntityName) -> Result<Committed, SyncError> {
        match self.backend.remove_one(&self.client, name).await {
            Ok(()) => Ok(Committed::Removed(name.clone())),
            Err(SyncError::NotFound(_)) => Ok(Committed::AlreadyRemoved(name.clone())),
            Err(e) => Err(e),
        }
    }

    async fn commit_clear(&self) -> Result<Committed, SyncError> {
        match self.backend.clear_all(&self.client).await {
            Ok(count) => Ok(Committed::Cleared(count)),
            Err(SyncError::NotFound(_)) => Ok(Committed::Cleared(0)),
            Err(e) => Err(e),
        }
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, SyncError> {
        let mut state = self.state.lock();
        if state.busy {
            tracing::debug!("dropping re-entrant submit");
            return Err(SyncError::Busy);
        }
        state.busy = true;
        Ok(BusyGuard { state: &self.state })
    }

    fn report(&self, err: &SyncError) {
        if matches!(err, SyncError::Busy) {
            return;
        }
        self.feedback.notify_with(err.severity(), err.user_message());
    }

    fn announce(&self, outcome: &CommitOutcome) {
        let (severity, message) = match outcome {
            CommitOutcome::Saved { saved_count, .. } => {
                (Severity::Success, format!("Saved {}", sdes(*saved_count)))
            }
            CommitOutcome::NothingToSave => {
                (Severity::Success, "All selected SDEs are already saved".to_string())
            }
            CommitOutcome::Removed(name) => (Severity::Success, format!("Removed saved SDE {name}")),
            CommitOutcome::AlreadyRemoved(name) => {
                (Severity::Routine, format!("{name} was already removed"))
            }
            CommitOutcome::Cleared { cleared_count } => {
                (Severity::Success, format!("Cleared {} from saved", sdes(*cleared_count)))
            }
        };
        self.feedback.notify_with(severity, message);
    }

    fn save_selection_hint(&self, selection: &SelectionSet) {
        if let Some(hints) = &self.hints {
            if let Err(e) = hints.save_selection(selection) {
                tracing::warn!(error = %e, "failed to cache selection");
            }
        }
    }
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("client", &self.client)
            .field("hints", &self.hints.is_some())
            .finish_non_exhaustive()
    }
}

fn sdes(count: u64) -> String {
    if count == 1 {
        "1 SDE".to_string()
    } else {
        format!("{count} SDEs")
    }
}

fn apply_committed(state: &mut EngineState, committed: Committed) -> CommitOutcome {
    match committed {
        Committed::Saved {
            saved_count,
            delta,
            refreshed,
        } => {
            let applied = refreshed.is_some_and(|(ticket, records)| state.mirror.apply_fetch(ticket, records));
            if !applied {
                state.mirror.apply_saved(&delta);
            }
            let EngineState { pending, mirror, catalog, .. } = state;
            pending.merge_records(mirror.records());
            pending.attach_catalog(catalog);
            CommitOutcome::Saved {
                saved_count,
                persisted: mirror.len(),
            }
        }
        Committed::Removed(name) => {
            state.mirror.apply_removed(&name);
            state.pending.remove_name(&name);
            CommitOutcome::Removed(name)
        }
        Committed::AlreadyRemoved(name) => {
            state.mirror.apply_removed(&name);
            state.pending.remove_name(&name);
            CommitOutcome::AlreadyRemoved(name)
        }
        Committed::Cleared(cleared_count) => {
            state.mirror.apply_cleared();
            state.pending.clear();
            CommitOutcome::Cleared { cleared_count }
        }
    }
}
