//! Testing utilities for the SDE workspace
//!
//! Fixtures plus [`FakeBackend`], an in-memory selection service with
//! scripted failures and response gates.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sde_catalog::{
    ClientId, EntityDefinition, EntityDraft, EntityName, IndustryFilter, SelectionRecord, Sensitivity,
};
use sde_sync::{AffectedSdes, ConstraintConflict, ReconciliationEngine, SdeBackend, SyncError};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub fn name(text: &str) -> EntityName {
    EntityName::new(text).unwrap()
}

pub fn client() -> ClientId {
    ClientId::new("acme").unwrap()
}

pub fn entity(id: u64, entity_name: &str, sensitivity: Sensitivity) -> EntityDefinition {
    EntityDefinition::new(id, name(entity_name), sensitivity)
}

pub fn industry_entity(id: u64, entity_name: &str, sensitivity: Sensitivity, industry: &str) -> EntityDefinition {
    entity(id, entity_name, sensitivity).with_industry(industry)
}

pub fn record(entity_name: &str, sensitivity: Sensitivity) -> SelectionRecord {
    SelectionRecord::new(name(entity_name), sensitivity)
}

/// Engine over `backend` with no debounce delay
pub fn engine(backend: &Arc<FakeBackend>) -> ReconciliationEngine {
    let backend: Arc<dyn SdeBackend> = backend.clone();
    ReconciliationEngine::new(client(), backend).with_debounce(Duration::ZERO)
}

/// Backend operation, for scripting and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    FetchCatalog,
    FetchPersisted,
    CommitDelta,
    RemoveOne,
    ClearAll,
    CreateEntity,
}

/// Holds one backend response until released
#[derive(Debug, Clone, Default)]
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn release(&self) {
        self.0.notify_one();
    }

    async fn wait(&self) {
        self.0.notified().await;
    }
}

#[derive(Debug, Default)]
struct FakeState {
    catalogs: HashMap<String, Vec<EntityDefinition>>,
    persisted: Vec<SelectionRecord>,
    findings: HashMap<EntityName, u64>,
    failures: HashMap<Call, VecDeque<SyncError>>,
    gates: HashMap<Call, VecDeque<Gate>>,
    calls: HashMap<Call, usize>,
    commits: Vec<Vec<SelectionRecord>>,
    next_id: u64,
}

/// In-memory selection service
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `entries` for `filter`
    pub fn set_catalog(&self, filter: &IndustryFilter, entries: Vec<EntityDefinition>) {
        let mut state = self.state.lock();
        let max_id = entries
            .iter()
            .filter_map(|e| e.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(max_id + 1);
        state.catalogs.insert(filter.as_query().to_string(), entries);
    }

    /// Replace server-side selection
    pub fn set_persisted(&self, records: Vec<SelectionRecord>) {
        self.state.lock().persisted = records;
    }

    pub fn persisted(&self) -> Vec<SelectionRecord> {
        self.state.lock().persisted.clone()
    }

    /// Make removal of `entity_name` fail with `count` referencing findings
    pub fn block_with_findings(&self, entity_name: &str, count: u64) {
        self.state.lock().findings.insert(name(entity_name), count);
    }

    /// Fail the next `call` with `err`
    pub fn fail_next(&self, call: Call, err: SyncError) {
        self.state.lock().failures.entry(call).or_default().push_back(err);
    }

    /// Hold the next `call` response until the returned gate is released
    pub fn gate_next(&self, call: Call) -> Gate {
        let gate = Gate::default();
        self.state.lock().gates.entry(call).or_default().push_back(gate.clone());
        gate
    }

    pub fn calls(&self, call: Call) -> usize {
        self.state.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// Every delta received by `commit_delta`, in order
    pub fn commits(&self) -> Vec<Vec<SelectionRecord>> {
        self.state.lock().commits.clone()
    }

    fn enter(&self, call: Call) -> (Option<SyncError>, Option<Gate>) {
        let mut state = self.state.lock();
        *state.calls.entry(call).or_default() += 1;
        let failure = state.failures.get_mut(&call).and_then(VecDeque::pop_front);
        let gate = state.gates.get_mut(&call).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    async fn respond<T>(&self, call: Call, answer: impl FnOnce(&mut FakeState) -> Result<T, SyncError>) -> Result<T, SyncError> {
        let (failure, gate) = self.enter(call);
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut state = self.state.lock();
                answer(&mut *state)
            }
        };
        if let Some(gate) = gate {
            gate.wait().await;
        }
        result
    }
}

fn conflict(state: &FakeState, names: &[EntityName]) -> Option<SyncError> {
    let blocked: Vec<(&EntityName, u64)> = names
        .iter()
        .filter_map(|n| state.findings.get(n).map(|count| (n, *count)))
        .collect();
    if blocked.is_empty() {
        return None;
    }
    let affected = AffectedSdes::Names(blocked.iter().map(|(n, _)| n.as_str().to_string()).collect());
    let findings = blocked.iter().map(|(_, count)| count).sum();
    Some(SyncError::ConstraintViolation(ConstraintConflict::new(affected, findings)))
}

#[async_trait]
impl SdeBackend for FakeBackend {
    async fn fetch_catalog(&self, filter: &IndustryFilter) -> Result<Vec<EntityDefinition>, SyncError> {
        let key = filter.as_query().to_string();
        self.respond(Call::FetchCatalog, |state| {
            Ok(state.catalogs.get(&key).cloned().unwrap_or_default())
        })
        .await
    }

    async fn fetch_persisted(&self, _client: &ClientId) -> Result<Vec<SelectionRecord>, SyncError> {
        self.respond(Call::FetchPersisted, |state| Ok(state.persisted.clone())).await
    }

    async fn commit_delta(&self, _client: &ClientId, delta: &[SelectionRecord]) -> Result<u64, SyncError> {
        self.respond(Call::CommitDelta, |state| {
            state.commits.push(delta.to_vec());
            let mut saved = 0;
            for incoming in delta {
                match state.persisted.iter_mut().find(|r| r.name == incoming.name) {
                    Some(existing) => *existing = incoming.clone(),
                    None => {
                        state.persisted.push(incoming.clone());
                        saved += 1;
                    }
                }
            }
            Ok(saved)
        })
        .await
    }

    async fn remove_one(&self, _client: &ClientId, entity_name: &EntityName) -> Result<(), SyncError> {
        self.respond(Call::RemoveOne, |state| {
            if let Some(err) = conflict(state, std::slice::from_ref(entity_name)) {
                return Err(err);
            }
            let before = state.persisted.len();
            state.persisted.retain(|r| &r.name != entity_name);
            if state.persisted.len() == before {
                return Err(SyncError::NotFound(format!("SDE '{entity_name}' not found")));
            }
            Ok(())
        })
        .await
    }

    async fn clear_all(&self, _client: &ClientId) -> Result<u64, SyncError> {
        self.respond(Call::ClearAll, |state| {
            let names: Vec<EntityName> = state.persisted.iter().map(|r| r.name.clone()).collect();
            if let Some(err) = conflict(state, &names) {
                return Err(err);
            }
            let cleared = state.persisted.len() as u64;
            state.persisted.clear();
            Ok(cleared)
        })
        .await
    }

    async fn create_entity(&self, draft: &EntityDraft) -> Result<EntityDefinition, SyncError> {
        self.respond(Call::CreateEntity, |state| {
            let id = state.next_id.max(1);
            state.next_id = id + 1;
            let mut created = EntityDefinition::new(id, EntityName::new(&draft.name).map_err(|e| SyncError::Server {
                status: 422,
                message: e.to_string(),
            })?, draft.sensitivity)
                .with_pattern(draft.detection_pattern.clone())
                .with_classification(draft.classification.clone());
            if let Some(tag) = &draft.industry_tag {
                created = created.with_industry(tag.clone());
            }
            state
                .catalogs
                .entry(draft.bucket().as_query().to_string())
                .or_default()
                .push(created.clone());
            Ok(created)
        })
        .await
    }
}
