// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tsrm_core::{EngineError, FakeIdGen, OrgId, RuleDoc, RuleType, RulesetDoc, Severity, Tags};
use tsrm_remote::InMemoryRemoteClient;
use tsrm_storage::{Mirror, StateStore};

use super::Engine;
use crate::fanout::OrgLocks;
use crate::options::EngineOptions;

fn new_engine(dir: &std::path::Path, options: EngineOptions) -> Engine {
    Engine::new(
        OrgId::from("org-1"),
        Arc::new(Mirror::new(dir, options.suffix.clone())),
        Arc::new(StateStore::new(dir.join("state.json"))),
        Arc::new(FakeIdGen::new()),
        Arc::new(InMemoryRemoteClient::new()),
        options,
        OrgLocks::new(),
    )
}

fn rule(name: &str) -> RuleDoc {
    RuleDoc::builder().name(name).rule_type(RuleType::Host).severity(Severity::Two).build()
}

#[tokio::test]
async fn create_rule_round_trip_via_create_ruleset_then_eager_push() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions { eager_push: true, ..Default::default() });

    let rs_id = engine.create_ruleset(RulesetDoc::builder().name("rs1").build(), None).await.unwrap();

    let rule_id = engine
        .create_rule(&rs_id, rule("a"), Tags::default(), None)
        .await
        .unwrap();

    // Eager push should have renamed both directories to remote-assigned IDs.
    let hierarchy = engine.list_hierarchy().await.unwrap();
    assert_eq!(hierarchy.len(), 1);
    assert_eq!(hierarchy[0].rules.len(), 1);
    assert_ne!(hierarchy[0].rules[0].id, rule_id);

    let state = engine.store.load().await.unwrap();
    assert!(state.organizations.is_empty());
}

#[tokio::test]
async fn delete_then_readd_ruleset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions::default());

    // Seed a remote-tracked ruleset directly via mirror + state, matching
    // a ruleset that already exists on the platform (no local-only suffix).
    let rs_id = tsrm_core::RulesetId::from("RS1");
    engine.mirror.ensure_org_dir(engine.org.as_str()).await.unwrap();
    tokio::fs::create_dir_all(engine.mirror.ruleset_dir(engine.org.as_str(), "RS1")).await.unwrap();
    tsrm_storage::fs_store::write(
        &engine.mirror.ruleset_dir(engine.org.as_str(), "RS1").join("ruleset.json"),
        &RulesetDoc::builder().name("rs").build(),
    )
    .await
    .unwrap();

    engine.delete_ruleset(&rs_id).await.unwrap();

    let err = engine.update_ruleset(&rs_id, &RulesetDoc::builder().name("rs").build()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvariantViolation(_)));
}

#[tokio::test]
async fn update_rule_on_an_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions::default());

    let err = engine
        .update_rule(&tsrm_core::RuleId::from("nope"), &rule("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn copy_ruleset_duplicates_rules_with_uniquified_names_and_leaves_original_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions::default());

    let rs_id = engine.create_ruleset(RulesetDoc::builder().name("R").build(), None).await.unwrap();
    engine.create_rule(&rs_id, rule("a"), Tags::default(), None).await.unwrap();
    engine.create_rule(&rs_id, rule("b"), Tags::default(), None).await.unwrap();

    let copy_id = engine.copy_ruleset(&rs_id, None).await.unwrap();
    assert_ne!(copy_id, rs_id);

    let hierarchy = engine.list_hierarchy().await.unwrap();
    assert_eq!(hierarchy.len(), 2);

    let original = hierarchy.iter().find(|rs| rs.id == rs_id).unwrap();
    assert_eq!(original.name, "R");
    assert_eq!(original.rules.len(), 2);

    let copy = hierarchy.iter().find(|rs| rs.id == copy_id).unwrap();
    assert_eq!(copy.name, "R - COPY");
    assert_eq!(copy.rules.len(), 2);
    let mut copy_names: Vec<&str> = copy.rules.iter().map(|r| r.name.as_str()).collect();
    copy_names.sort();
    assert_eq!(copy_names, vec!["a", "b"]);
}

#[tokio::test]
async fn create_ruleset_uniquifies_a_colliding_name() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions::default());

    engine.create_ruleset(RulesetDoc::builder().name("dup").build(), None).await.unwrap();
    let second = engine.create_ruleset(RulesetDoc::builder().name("dup").build(), None).await.unwrap();

    let doc = engine.mirror.read_ruleset(engine.org.as_str(), second.as_str()).await.unwrap();
    assert_eq!(doc.name, "dup - COPY");
}

#[tokio::test]
async fn rulesets_view_refuses_while_a_refresh_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path(), EngineOptions::default());

    engine.mirror.ensure_org_dir(engine.org.as_str()).await.unwrap();
    engine.mirror.stage_for_refresh(engine.org.as_str()).await.unwrap();

    assert!(engine.rulesets_view().await.unwrap().is_none());
    assert!(engine.mirror.backup_dir_exists(engine.org.as_str()).await);
}
