// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tsrm_core::{FakeIdGen, RuleDoc, RulesetDoc, Tags};

use super::*;

fn mirror(dir: &Path) -> Mirror {
    Mirror::new(dir, "-localonly")
}

#[tokio::test]
async fn create_ruleset_writes_empty_ruleset_json() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();

    let id = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();

    assert!(id.is_local_only("-localonly"));
    let doc = m.read_ruleset("org1", id.as_str()).await.unwrap();
    assert_eq!(doc.name, "rs");
    assert!(doc.rule_ids.is_empty());
}

#[tokio::test]
async fn create_rule_appends_to_parent_rule_ids() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    let rs_id = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();

    let rule_id = m
        .create_rule(
            "org1",
            rs_id.as_str(),
            &id_gen,
            RuleDoc::builder().name("r1").build(),
            Tags::default(),
        )
        .await
        .unwrap();

    let doc = m.read_ruleset("org1", rs_id.as_str()).await.unwrap();
    assert_eq!(doc.rule_ids, vec![rule_id]);
}

#[tokio::test]
async fn delete_rule_removes_dir_and_parent_reference() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    let rs_id = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();
    let rule_id = m
        .create_rule(
            "org1",
            rs_id.as_str(),
            &id_gen,
            RuleDoc::builder().name("r1").build(),
            Tags::default(),
        )
        .await
        .unwrap();

    m.delete_rule("org1", rs_id.as_str(), rule_id.as_str()).await.unwrap();

    let doc = m.read_ruleset("org1", rs_id.as_str()).await.unwrap();
    assert!(doc.rule_ids.is_empty());
    assert!(!fs_store::exists(&m.rule_dir("org1", rs_id.as_str(), rule_id.as_str())).await);
}

#[tokio::test]
async fn locate_rule_scans_sibling_rulesets() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    let rs_a = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("a").build())
        .await
        .unwrap();
    let _rs_b = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("b").build())
        .await
        .unwrap();
    let rule_id = m
        .create_rule(
            "org1",
            rs_a.as_str(),
            &id_gen,
            RuleDoc::builder().name("r1").build(),
            Tags::default(),
        )
        .await
        .unwrap();

    let found = m.locate_rule("org1", rule_id.as_str()).await.unwrap();
    assert_eq!(found, Some(rs_a));
}

#[tokio::test]
async fn locate_rule_returns_none_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    m.ensure_org_dir("org1").await.unwrap();
    assert_eq!(m.locate_rule("org1", "nope").await.unwrap(), None);
}

#[tokio::test]
async fn ruleset_name_occurs_scans_all_rulesets() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    m.create_ruleset("org1", &id_gen, RulesetDoc::builder().name("taken").build())
        .await
        .unwrap();

    assert!(m.ruleset_name_occurs("org1", "taken").await.unwrap());
    assert!(!m.ruleset_name_occurs("org1", "free").await.unwrap());
}

#[tokio::test]
async fn list_ruleset_ids_excludes_staging_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    m.create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();
    tokio::fs::create_dir_all(m.org_dir("org1").join(".backup")).await.unwrap();
    tokio::fs::create_dir_all(m.org_dir("org1").join(".remote")).await.unwrap();

    let ids = m.list_ruleset_ids("org1").await.unwrap();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn stage_for_refresh_moves_rulesets_into_backup() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    let rs_id = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();

    m.stage_for_refresh("org1").await.unwrap();

    assert!(m.list_ruleset_ids("org1").await.unwrap().is_empty());
    assert!(m.backup_dir_exists("org1").await);
    assert!(fs_store::exists(&m.org_dir("org1").join(".backup").join(rs_id.as_str())).await);
}

#[tokio::test]
async fn restore_from_backup_moves_children_back() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    let rs_id = m
        .create_ruleset("org1", &id_gen, RulesetDoc::builder().name("rs").build())
        .await
        .unwrap();
    m.stage_for_refresh("org1").await.unwrap();

    m.restore_from_backup("org1").await.unwrap();

    assert!(!m.backup_dir_exists("org1").await);
    let ids = m.list_ruleset_ids("org1").await.unwrap();
    assert_eq!(ids, vec![rs_id]);
}

#[tokio::test]
async fn promote_remote_staging_replaces_org_contents() {
    let dir = tempfile::tempdir().unwrap();
    let m = mirror(dir.path());
    let id_gen = FakeIdGen::new();
    m.ensure_org_dir("org1").await.unwrap();
    m.create_ruleset("org1", &id_gen, RulesetDoc::builder().name("old").build())
        .await
        .unwrap();
    m.stage_for_refresh("org1").await.unwrap();
    m.write_remote_ruleset("org1", "RS1", &RulesetDoc::builder().name("new").build())
        .await
        .unwrap();

    m.promote_remote_staging("org1").await.unwrap();

    assert!(!m.backup_dir_exists("org1").await);
    assert!(!m.is_refreshing("org1").await);
    let ids = m.list_ruleset_ids("org1").await.unwrap();
    assert_eq!(ids, vec![RulesetId::from("RS1")]);
}

#[tokio::test]
async fn ensure_gitignore_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    ensure_gitignore(dir.path(), "state.json").await.unwrap();
    let contents = tokio::fs::read_to_string(dir.path().join(".gitignore")).await.unwrap();
    assert_eq!(contents, "state.json\n");

    tokio::fs::write(dir.path().join(".gitignore"), "custom\n").await.unwrap();
    ensure_gitignore(dir.path(), "state.json").await.unwrap();
    let contents = tokio::fs::read_to_string(dir.path().join(".gitignore")).await.unwrap();
    assert_eq!(contents, "custom\n");
}
