// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tsrm_core::{RuleDoc, RulesetDoc, Tags};

use super::*;

#[tokio::test]
async fn post_ruleset_then_get_rulesets_round_trips() {
    let client = InMemoryRemoteClient::new();
    let doc = RulesetDoc::builder().name("my-ruleset").build();

    let id = client.post_ruleset(&doc).await.unwrap();
    let rulesets = client.get_rulesets().await.unwrap();

    assert_eq!(rulesets.len(), 1);
    assert_eq!(rulesets[0].id, id);
    assert_eq!(rulesets[0].name, "my-ruleset");
}

#[tokio::test]
async fn post_rule_appends_to_ruleset_rules() {
    let client = InMemoryRemoteClient::new();
    let ruleset_id = client
        .post_ruleset(&RulesetDoc::builder().build())
        .await
        .unwrap();
    let rule = RuleDoc::builder().name("my-rule").build();

    let rule_id = client.post_rule(&ruleset_id, &rule).await.unwrap();
    let rules = client.get_ruleset_rules(&ruleset_id).await.unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, rule_id);
    assert_eq!(rules[0].doc.name, "my-rule");
}

#[tokio::test]
async fn post_tags_then_get_rule_tags_round_trips() {
    let client = InMemoryRemoteClient::new();
    let ruleset_id = client
        .post_ruleset(&RulesetDoc::builder().build())
        .await
        .unwrap();
    let rule_id = client
        .post_rule(&ruleset_id, &RuleDoc::builder().build())
        .await
        .unwrap();
    let tags = Tags {
        inclusion: vec!["prod".into()],
        exclusion: vec![],
    };

    client.post_tags(&rule_id, &tags).await.unwrap();
    let fetched = client.get_rule_tags(&rule_id).await.unwrap();

    assert_eq!(fetched, tags);
}

#[tokio::test]
async fn delete_ruleset_removes_it() {
    let client = InMemoryRemoteClient::new();
    let ruleset_id = client
        .post_ruleset(&RulesetDoc::builder().build())
        .await
        .unwrap();

    client.delete_ruleset(&ruleset_id).await.unwrap();

    assert_eq!(client.ruleset_count(), 0);
    assert!(client.delete_ruleset(&ruleset_id).await.is_err());
}

#[tokio::test]
async fn fail_next_injects_a_single_failure() {
    let client = InMemoryRemoteClient::new();
    client.fail_next(RemoteOp::PostRuleset);

    let first = client.post_ruleset(&RulesetDoc::builder().build()).await;
    assert!(first.is_err());

    let second = client.post_ruleset(&RulesetDoc::builder().build()).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn seed_ruleset_and_seed_rule_populate_fixtures() {
    let client = InMemoryRemoteClient::new();
    client.seed_ruleset("RS1", RulesetDoc::builder().name("seeded").build());
    client.seed_rule(
        "RS1",
        "R1",
        RuleDoc::builder().name("seeded-rule").build(),
        Tags::default(),
    );

    let rules = client.get_ruleset_rules("RS1").await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].doc.name, "seeded-rule");
}

#[tokio::test]
async fn operations_on_unknown_ids_return_not_found() {
    let client = InMemoryRemoteClient::new();

    assert!(client.get_ruleset_rules("missing").await.is_err());
    assert!(client.get_rule_tags("missing").await.is_err());
    assert!(client
        .put_ruleset("missing", &RulesetDoc::builder().build())
        .await
        .is_err());
}
