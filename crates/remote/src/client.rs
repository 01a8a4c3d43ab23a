// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The remote-platform capability contract. No HTTP implementation lives
//! here — the real client is an out-of-scope external collaborator; this
//! crate only defines the shape the reconciler depends on and, behind
//! `test-support`, an in-memory fake of it.
//!
//! Any response the real implementation receives that contains an
//! `errors` field is a failure — that check belongs to the (out-of-scope)
//! HTTP implementation of this trait, not to callers here, which only ever
//! see `Result`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tsrm_core::{RuleDoc, RulesetDoc, Tags};

use crate::error::RemoteError;

/// `getRulesets() → {rulesets:[{id,name,description,ruleIds,createdAt,updatedAt}]}`,
/// one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRulesetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "ruleIds", default)]
    pub rule_ids: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// `getRulesetRules(rsid) → {ruleIds:[<full rule object>,...]}`, one element
/// of that array. The wire key is `ruleIds` for historical reasons even
/// though the elements are full rule documents, not bare IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRule {
    pub id: String,
    #[serde(flatten)]
    pub doc: RuleDoc,
}

#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn get_rulesets(&self) -> Result<Vec<RemoteRulesetSummary>, RemoteError>;
    async fn get_ruleset_rules(&self, ruleset_id: &str) -> Result<Vec<RemoteRule>, RemoteError>;
    async fn get_rule_tags(&self, rule_id: &str) -> Result<Tags, RemoteError>;

    /// `postRuleset(data) → {id, ...}`. Returns the remote-assigned ID.
    async fn post_ruleset(&self, data: &RulesetDoc) -> Result<String, RemoteError>;
    async fn put_ruleset(&self, ruleset_id: &str, data: &RulesetDoc) -> Result<(), RemoteError>;
    async fn delete_ruleset(&self, ruleset_id: &str) -> Result<(), RemoteError>;

    /// `postRule(rsid, data) → {id, ...}`. Returns the remote-assigned ID.
    async fn post_rule(&self, ruleset_id: &str, data: &RuleDoc) -> Result<String, RemoteError>;
    async fn put_rule(&self, ruleset_id: &str, rule_id: &str, data: &RuleDoc) -> Result<(), RemoteError>;
    async fn delete_rule(&self, ruleset_id: &str, rule_id: &str) -> Result<(), RemoteError>;

    async fn post_tags(&self, rule_id: &str, data: &Tags) -> Result<(), RemoteError>;
}
