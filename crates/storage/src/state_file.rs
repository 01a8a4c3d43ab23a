// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-file primitives: the six transitions over the pending-change
//! document, plus a `StateStore` that serializes read-modify-write cycles
//! across organization workers.
//!
//! The state file is a single small document shared by every organization
//! worker, so access is guarded by one process-wide `parking_lot::Mutex`.
//! The guarded section runs entirely on a blocking-pool thread via
//! `spawn_blocking` rather than holding the lock across an `.await`, since
//! `parking_lot::Mutex` is not async-aware.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tsrm_core::{OrgId, RuleId, RuleStatus, RulesetAction, RulesetId, RulesetPending, RulesetStatus, StateFile};

use crate::error::StoreError;

/// Serializes access to one on-disk state-file document.
#[derive(Clone)]
pub struct StateStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. An absent file reads as the empty
    /// default — absence of an organization's key means nothing pending,
    /// extended to the whole-file case.
    pub async fn load(&self) -> Result<StateFile, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_sync(&path))
            .await
            .map_err(|e| StoreError::Invariant(e.to_string()))?
    }

    /// Load, apply `mutate` to the in-memory document, prune empty entries,
    /// and write back — one read-modify-write cycle under the process-wide
    /// lock. Callers that need to batch several transitions into a single
    /// write should mutate the snapshot passed to them rather than calling
    /// `commit` once per transition.
    pub async fn commit<F>(&self, mutate: F) -> Result<StateFile, StoreError>
    where
        F: FnOnce(&mut StateFile) -> Result<(), StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock = self.lock.clone();
        tokio::task::spawn_blocking(move || -> Result<StateFile, StoreError> {
            let _guard = lock.lock();
            let mut state = load_sync(&path)?;
            mutate(&mut state)?;
            state.prune();
            save_sync(&path, &state)?;
            Ok(state)
        })
        .await
        .map_err(|e| StoreError::Invariant(e.to_string()))?
    }
}

fn load_sync(path: &Path) -> Result<StateFile, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateFile::default()),
        Err(e) => Err(e.into()),
    }
}

fn save_sync(path: &Path, state: &StateFile) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(state)?;
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Invariant(format!("path has no parent: {}", path.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// `addOrg(org)` — idempotent.
pub fn add_org(state: &mut StateFile, org: &OrgId) {
    state.organizations.entry(org.clone()).or_default();
}

/// `delOrg(org)` — removes the organization entry unconditionally. Used
/// only by refresh on success.
pub fn del_org(state: &mut StateFile, org: &OrgId) {
    state.organizations.shift_remove(org);
}

/// `addRuleset(org, ruleset_id, action)` — transitions per the ruleset
/// lattice; rejects re-adding a `del` ruleset.
pub fn add_ruleset(
    state: &mut StateFile,
    org: &OrgId,
    ruleset_id: &RulesetId,
    action: RulesetAction,
) -> Result<(), StoreError> {
    let org_pending = state.organizations.entry(org.clone()).or_default();
    match org_pending.get_mut(ruleset_id) {
        Some(pending) => {
            pending.modified = pending
                .modified
                .transition(action)
                .map_err(|e| StoreError::Invariant(e.to_string()))?;
        }
        None => {
            let initial = match action {
                RulesetAction::MarkModified => RulesetStatus::Modified,
                RulesetAction::MarkUnmodified => RulesetStatus::Unmodified,
            };
            org_pending.insert(ruleset_id.clone(), RulesetPending::new(initial));
        }
    }
    Ok(())
}

/// `delRuleset(org, ruleset_id)` — for local-only IDs the caller removes
/// the entry outright (see `remove_ruleset_entry`); otherwise sets
/// `modified = del` and clears `ruleIds` (inv. 2).
pub fn del_ruleset(state: &mut StateFile, org: &OrgId, ruleset_id: &RulesetId, local_only_suffix: &str) {
    if ruleset_id.is_local_only(local_only_suffix) {
        if let Some(org_pending) = state.organizations.get_mut(org) {
            org_pending.shift_remove(ruleset_id);
        }
        return;
    }
    let org_pending = state.organizations.entry(org.clone()).or_default();
    let pending = org_pending
        .entry(ruleset_id.clone())
        .or_insert_with(|| RulesetPending::new(RulesetStatus::Unmodified));
    pending.modified = RulesetStatus::Del;
    pending.rule_ids.clear();
}

/// `addRule(org, ruleset_id, rule_id, endpoint)` — monotone join on the
/// rule status lattice; rejects modifying a `del` rule. Auto-creates the
/// ruleset entry with `modified = false` if missing.
pub fn add_rule(
    state: &mut StateFile,
    org: &OrgId,
    ruleset_id: &RulesetId,
    rule_id: &RuleId,
    endpoint: RuleStatus,
) -> Result<(), StoreError> {
    let org_pending = state.organizations.entry(org.clone()).or_default();
    let pending = org_pending
        .entry(ruleset_id.clone())
        .or_insert_with(|| RulesetPending::new(RulesetStatus::Unmodified));
    match pending.rule_ids.get(rule_id).copied() {
        Some(current) => {
            let joined = current
                .join(endpoint)
                .map_err(|e| StoreError::Invariant(e.to_string()))?;
            pending.rule_ids.insert(rule_id.clone(), joined);
        }
        None => {
            pending.rule_ids.insert(rule_id.clone(), endpoint);
        }
    }
    Ok(())
}

/// `delRule(org, ruleset_id, rule_id)` — for local-only IDs removes the
/// entry; otherwise sets to `del`.
pub fn del_rule(
    state: &mut StateFile,
    org: &OrgId,
    ruleset_id: &RulesetId,
    rule_id: &RuleId,
    local_only_suffix: &str,
) {
    let Some(org_pending) = state.organizations.get_mut(org) else {
        return;
    };
    let Some(pending) = org_pending.get_mut(ruleset_id) else {
        return;
    };
    if rule_id.is_local_only(local_only_suffix) {
        pending.rule_ids.shift_remove(rule_id);
    } else {
        pending.rule_ids.insert(rule_id.clone(), RuleStatus::Del);
    }
}

#[cfg(test)]
#[path = "state_file_tests.rs"]
mod tests;
