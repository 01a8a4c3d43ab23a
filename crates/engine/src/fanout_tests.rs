// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tsrm_core::OrgId;
use tsrm_remote::{InMemoryRemoteClient, RemoteOp};
use tsrm_storage::{Mirror, StateStore};

use super::{reconcile_many, OrgLocks, ReconcileKind};

const SUFFIX: &str = "-localonly";

#[tokio::test]
async fn push_fans_out_across_organizations_with_exactly_one_delete_per_org() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(Mirror::new(dir.path(), SUFFIX));
    let store = Arc::new(StateStore::new(dir.path().join("state.json")));
    let remote = Arc::new(InMemoryRemoteClient::new());

    let orgs: Vec<OrgId> = vec![OrgId::from("org-a"), OrgId::from("org-b"), OrgId::from("org-c")];
    for (i, org) in orgs.iter().enumerate() {
        let ruleset_id = format!("RS{i}");
        remote.seed_ruleset(&ruleset_id, tsrm_core::RulesetDoc::builder().name("doomed").build());
        store
            .commit({
                let org = org.clone();
                let ruleset_id = tsrm_core::RulesetId::from(ruleset_id);
                move |state| {
                    tsrm_storage::del_ruleset(state, &org, &ruleset_id, SUFFIX);
                    Ok(())
                }
            })
            .await
            .unwrap();
    }

    let locks = OrgLocks::new();
    let results = reconcile_many(
        ReconcileKind::Push,
        &orgs,
        mirror.clone(),
        store.clone(),
        remote.clone(),
        SUFFIX,
        4,
        &locks,
    )
    .await;

    assert_eq!(results.len(), 3);
    for (org, result) in &results {
        assert!(result.is_ok(), "push failed for {org:?}: {result:?}");
    }

    let state = store.load().await.unwrap();
    for org in &orgs {
        assert!(!state.organizations.contains_key(org), "{org:?} still has a pending entry");
    }
    assert_eq!(remote.call_count(RemoteOp::DeleteRuleset), 3);
    assert_eq!(remote.ruleset_count(), 0);
}

#[tokio::test]
async fn reconcile_many_runs_sequentially_with_a_single_worker() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(Mirror::new(dir.path(), SUFFIX));
    let store = Arc::new(StateStore::new(dir.path().join("state.json")));
    let remote = Arc::new(InMemoryRemoteClient::new());

    let orgs: Vec<OrgId> = vec![OrgId::from("org-a"), OrgId::from("org-b")];
    for (i, org) in orgs.iter().enumerate() {
        let ruleset_id = format!("RS{i}");
        remote.seed_ruleset(&ruleset_id, tsrm_core::RulesetDoc::builder().name("doomed").build());
        store
            .commit({
                let org = org.clone();
                let ruleset_id = tsrm_core::RulesetId::from(ruleset_id);
                move |state| {
                    tsrm_storage::del_ruleset(state, &org, &ruleset_id, SUFFIX);
                    Ok(())
                }
            })
            .await
            .unwrap();
    }

    let locks = OrgLocks::new();
    let results = reconcile_many(ReconcileKind::Push, &orgs, mirror, store.clone(), remote.clone(), SUFFIX, 1, &locks).await;

    assert_eq!(results.len(), 2);
    for (_, result) in &results {
        assert!(result.is_ok());
    }
    assert_eq!(remote.call_count(RemoteOp::DeleteRuleset), 2);
}

#[tokio::test]
async fn org_locks_serialize_acquisitions_for_the_same_org() {
    let locks = OrgLocks::new();
    let org = OrgId::from("org-a");

    let first = locks.acquire(&org).await;
    let second_locks = locks.clone();
    let second_org = org.clone();
    let mut second_attempt = tokio::spawn(async move {
        let _guard = second_locks.acquire(&second_org).await;
    });

    // The second acquisition cannot complete while the first guard is held.
    tokio::select! {
        _ = &mut second_attempt => panic!("second acquire completed while first guard was held"),
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
    }

    drop(first);
    second_attempt.await.unwrap();
}
