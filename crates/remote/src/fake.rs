// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory fake of [`RemoteClient`]: seed it with remote-side
//! fixtures, optionally queue one-shot failures, and exercise push/refresh
//! against it without a network.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tsrm_core::{RuleDoc, RulesetDoc, Tags};

use crate::client::{RemoteClient, RemoteRule, RemoteRulesetSummary};
use crate::error::RemoteError;

/// Names the ten operations in [`RemoteClient`], for one-shot failure
/// injection via [`InMemoryRemoteClient::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    GetRulesets,
    GetRulesetRules,
    GetRuleTags,
    PostRuleset,
    PutRuleset,
    DeleteRuleset,
    PostRule,
    PutRule,
    DeleteRule,
    PostTags,
}

struct RulesetRecord {
    doc: RulesetDoc,
    rules: HashMap<String, (RuleDoc, Tags)>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    rulesets: HashMap<String, RulesetRecord>,
}

impl State {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

pub struct InMemoryRemoteClient {
    state: Mutex<State>,
    pending_failures: Mutex<Vec<RemoteOp>>,
    call_counts: Mutex<HashMap<RemoteOp, u64>>,
}

impl Default for InMemoryRemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            pending_failures: Mutex::new(Vec::new()),
            call_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a one-shot failure: the next call to `op` returns
    /// `Err(RemoteError::RequestFailed)` instead of succeeding.
    pub fn fail_next(&self, op: RemoteOp) {
        self.pending_failures.lock().push(op);
    }

    /// Number of times `op` has been invoked so far (including calls that
    /// were made to fail via [`Self::fail_next`]).
    pub fn call_count(&self, op: RemoteOp) -> u64 {
        self.call_counts.lock().get(&op).copied().unwrap_or(0)
    }

    fn take_failure(&self, op: RemoteOp) -> bool {
        *self.call_counts.lock().entry(op).or_insert(0) += 1;
        let mut pending = self.pending_failures.lock();
        if let Some(pos) = pending.iter().position(|queued| *queued == op) {
            pending.remove(pos);
            true
        } else {
            false
        }
    }

    /// Seed a remote ruleset fixture (for refresh tests), under a
    /// remote-assigned ID of the caller's choosing.
    pub fn seed_ruleset(&self, id: impl Into<String>, doc: RulesetDoc) {
        self.state.lock().rulesets.insert(
            id.into(),
            RulesetRecord {
                doc,
                rules: HashMap::new(),
            },
        );
    }

    /// Seed a rule (and its tags) under an already-seeded ruleset.
    pub fn seed_rule(&self, ruleset_id: &str, id: impl Into<String>, doc: RuleDoc, tags: Tags) {
        let mut state = self.state.lock();
        if let Some(record) = state.rulesets.get_mut(ruleset_id) {
            record.rules.insert(id.into(), (doc, tags));
        }
    }

    pub fn ruleset_count(&self) -> usize {
        self.state.lock().rulesets.len()
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemoteClient {
    async fn get_rulesets(&self) -> Result<Vec<RemoteRulesetSummary>, RemoteError> {
        if self.take_failure(RemoteOp::GetRulesets) {
            return Err(RemoteError::RequestFailed("get_rulesets".into()));
        }
        let state = self.state.lock();
        Ok(state
            .rulesets
            .iter()
            .map(|(id, record)| RemoteRulesetSummary {
                id: id.clone(),
                name: record.doc.name.clone(),
                description: record.doc.description.clone(),
                rule_ids: record.rules.keys().cloned().collect(),
                created_at: "1970-01-01T00:00:00Z".to_string(),
                updated_at: "1970-01-01T00:00:00Z".to_string(),
            })
            .collect())
    }

    async fn get_ruleset_rules(&self, ruleset_id: &str) -> Result<Vec<RemoteRule>, RemoteError> {
        if self.take_failure(RemoteOp::GetRulesetRules) {
            return Err(RemoteError::RequestFailed("get_ruleset_rules".into()));
        }
        let state = self.state.lock();
        let record = state
            .rulesets
            .get(ruleset_id)
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))?;
        Ok(record
            .rules
            .iter()
            .map(|(id, (doc, _tags))| RemoteRule {
                id: id.clone(),
                doc: doc.clone(),
            })
            .collect())
    }

    async fn get_rule_tags(&self, rule_id: &str) -> Result<Tags, RemoteError> {
        if self.take_failure(RemoteOp::GetRuleTags) {
            return Err(RemoteError::RequestFailed("get_rule_tags".into()));
        }
        let state = self.state.lock();
        for record in state.rulesets.values() {
            if let Some((_, tags)) = record.rules.get(rule_id) {
                return Ok(tags.clone());
            }
        }
        Err(RemoteError::NotFound(rule_id.to_string()))
    }

    async fn post_ruleset(&self, data: &RulesetDoc) -> Result<String, RemoteError> {
        if self.take_failure(RemoteOp::PostRuleset) {
            return Err(RemoteError::RequestFailed("post_ruleset".into()));
        }
        let mut state = self.state.lock();
        let id = state.fresh_id("RS");
        state.rulesets.insert(
            id.clone(),
            RulesetRecord {
                doc: data.clone(),
                rules: HashMap::new(),
            },
        );
        Ok(id)
    }

    async fn put_ruleset(&self, ruleset_id: &str, data: &RulesetDoc) -> Result<(), RemoteError> {
        if self.take_failure(RemoteOp::PutRuleset) {
            return Err(RemoteError::RequestFailed("put_ruleset".into()));
        }
        let mut state = self.state.lock();
        let record = state
            .rulesets
            .get_mut(ruleset_id)
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))?;
        record.doc = data.clone();
        Ok(())
    }

    async fn delete_ruleset(&self, ruleset_id: &str) -> Result<(), RemoteError> {
        if self.take_failure(RemoteOp::DeleteRuleset) {
            return Err(RemoteError::RequestFailed("delete_ruleset".into()));
        }
        let mut state = self.state.lock();
        state
            .rulesets
            .remove(ruleset_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))
    }

    async fn post_rule(&self, ruleset_id: &str, data: &RuleDoc) -> Result<String, RemoteError> {
        if self.take_failure(RemoteOp::PostRule) {
            return Err(RemoteError::RequestFailed("post_rule".into()));
        }
        let mut state = self.state.lock();
        let id = state.fresh_id("R");
        let record = state
            .rulesets
            .get_mut(ruleset_id)
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))?;
        record.rules.insert(id.clone(), (data.clone(), Tags::default()));
        Ok(id)
    }

    async fn put_rule(&self, ruleset_id: &str, rule_id: &str, data: &RuleDoc) -> Result<(), RemoteError> {
        if self.take_failure(RemoteOp::PutRule) {
            return Err(RemoteError::RequestFailed("put_rule".into()));
        }
        let mut state = self.state.lock();
        let record = state
            .rulesets
            .get_mut(ruleset_id)
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))?;
        let entry = record
            .rules
            .get_mut(rule_id)
            .ok_or_else(|| RemoteError::NotFound(rule_id.to_string()))?;
        entry.0 = data.clone();
        Ok(())
    }

    async fn delete_rule(&self, ruleset_id: &str, rule_id: &str) -> Result<(), RemoteError> {
        if self.take_failure(RemoteOp::DeleteRule) {
            return Err(RemoteError::RequestFailed("delete_rule".into()));
        }
        let mut state = self.state.lock();
        let record = state
            .rulesets
            .get_mut(ruleset_id)
            .ok_or_else(|| RemoteError::NotFound(ruleset_id.to_string()))?;
        record
            .rules
            .remove(rule_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(rule_id.to_string()))
    }

    async fn post_tags(&self, rule_id: &str, data: &Tags) -> Result<(), RemoteError> {
        if self.take_failure(RemoteOp::PostTags) {
            return Err(RemoteError::RequestFailed("post_tags".into()));
        }
        let mut state = self.state.lock();
        for record in state.rulesets.values_mut() {
            if let Some(entry) = record.rules.get_mut(rule_id) {
                entry.1 = data.clone();
                return Ok(());
            }
        }
        Err(RemoteError::NotFound(rule_id.to_string()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
