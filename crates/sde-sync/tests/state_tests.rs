//! Property tests for the action state machine and the save round trip

use proptest::prelude::*;
use sde_catalog::{EntityId, IndustryFilter, SelectionRecord, Sensitivity};
use sde_sync::{allowed_transitions, validate_transition, ActionPhase, CommitOutcome};
use sde_test_utils::{engine, entity, record, FakeBackend};
use std::collections::BTreeSet;

const PHASES: [ActionPhase; 7] = [
    ActionPhase::Idle,
    ActionPhase::Previewing,
    ActionPhase::Confirmed,
    ActionPhase::Committing,
    ActionPhase::Succeeded,
    ActionPhase::Failed,
    ActionPhase::Cancelled,
];

fn phase() -> impl Strategy<Value = ActionPhase> {
    (0..PHASES.len()).prop_map(|i| PHASES[i])
}

fn keyed(records: &[SelectionRecord]) -> BTreeSet<(String, Sensitivity)> {
    records
        .iter()
        .map(|r| (r.name.as_str().to_string(), r.sensitivity))
        .collect()
}

proptest! {
    #[test]
    fn prop_validate_matches_allowed(from in phase(), to in phase()) {
        let allowed = allowed_transitions(from).contains(&to);
        prop_assert_eq!(validate_transition(from, to).is_ok(), allowed);
    }

    #[test]
    fn prop_committing_only_after_confirmed(from in phase()) {
        let reaches_committing = allowed_transitions(from).contains(&ActionPhase::Committing);
        prop_assert_eq!(reaches_committing, from == ActionPhase::Confirmed);
    }

    #[test]
    fn prop_every_walk_returns_to_idle(steps in proptest::collection::vec(0usize..4, 0..20)) {
        // Walk the graph using `steps` to choose among legal edges; every
        // state must still be able to reach Idle.
        let mut current = ActionPhase::Idle;
        for step in steps {
            let next = allowed_transitions(current);
            prop_assert!(!next.is_empty());
            current = next[step % next.len()];
        }

        let mut seen = BTreeSet::new();
        let mut frontier = vec![current];
        while let Some(p) = frontier.pop() {
            if seen.insert(format!("{p:?}")) {
                frontier.extend(allowed_transitions(p));
            }
        }
        prop_assert!(seen.contains("Idle"));
    }

    #[test]
    fn prop_commit_then_fetch_matches_pending(
        saved in proptest::collection::vec(any::<bool>(), 6),
        extra in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let catalog: Vec<_> = (0..6u64)
            .map(|i| entity(i + 1, &format!("sde-{i}"), Sensitivity::ALL[(i % 3) as usize]))
            .collect();
        let persisted: Vec<SelectionRecord> = catalog
            .iter()
            .zip(&saved)
            .filter(|(_, on)| **on)
            .map(|(e, _)| e.to_record())
            .collect();

        let backend = FakeBackend::new();
        backend.set_catalog(&IndustryFilter::All, catalog.clone());
        backend.set_persisted(persisted);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (pending, outcome, after) = runtime.block_on(async {
            let engine = engine(&backend);
            engine.load_catalog(IndustryFilter::All).await.unwrap();
            engine.refresh_persisted().await.unwrap();
            for (e, add) in catalog.iter().zip(&extra) {
                let selected = engine.snapshot().pending.iter().any(|row| row.record.name == e.name);
                if *add && !selected {
                    engine.toggle(&e.id).unwrap();
                }
            }

            let pending: Vec<SelectionRecord> =
                engine.snapshot().pending.into_iter().map(|row| row.record).collect();
            engine.preview_save().await.unwrap();
            let outcome = engine.confirm().await.unwrap();
            (pending, outcome, engine.snapshot().persisted)
        });

        let outcome_ok = matches!(outcome, CommitOutcome::Saved { .. } | CommitOutcome::NothingToSave);
        prop_assert!(outcome_ok);
        prop_assert_eq!(keyed(&after), keyed(&pending));
        prop_assert_eq!(keyed(&backend.persisted()), keyed(&pending));
    }
}

#[test]
fn single_record_round_trip() {
    let backend = FakeBackend::new();
    backend.set_catalog(&IndustryFilter::All, vec![entity(1, "email", Sensitivity::High)]);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let engine = engine(&backend);
        engine.load_catalog(IndustryFilter::All).await.unwrap();
        engine.toggle(&EntityId::from(1)).unwrap();
        engine.preview_save().await.unwrap();
        engine.confirm().await.unwrap();
    });

    assert_eq!(backend.persisted(), vec![record("email", Sensitivity::High)]);
}
