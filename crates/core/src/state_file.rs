// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state-file schema as plain data. The six mutating transitions
//! (`addOrg`, `delOrg`, `addRuleset`, `delRuleset`, `addRule`, `delRule`)
//! live in `tsrm-storage::state_file` as pure functions over these types
//! — this module only owns the shape and the empty-entry pruning helper
//! every transition needs.
//!
//! Ruleset and organization maps preserve insertion order (`indexmap`) so
//! the reconciler can iterate rulesets in insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{OrgId, RuleId, RulesetId};
use crate::status::RulesetStatus;

/// Pending changes for a single ruleset within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetPending {
    pub modified: RulesetStatus,
    #[serde(rename = "ruleIds", default)]
    pub rule_ids: IndexMap<RuleId, crate::status::RuleStatus>,
}

impl RulesetPending {
    pub fn new(modified: RulesetStatus) -> Self {
        Self {
            modified,
            rule_ids: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rule_ids.is_empty()
    }
}

/// Pending changes for a single organization: ruleset id -> its pending entry.
pub type OrgPending = IndexMap<RulesetId, RulesetPending>;

/// The whole on-disk state-file document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub workspace: String,
    #[serde(default)]
    pub organizations: IndexMap<OrgId, OrgPending>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            workspace: String::new(),
            organizations: IndexMap::new(),
        }
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop ruleset entries with no pending rule work and an unmodified
    /// status, and drop organization entries left with no ruleset work.
    /// Empty organization or ruleset entries must be pruned on each write.
    pub fn prune(&mut self) {
        for org in self.organizations.values_mut() {
            org.retain(|_, pending| {
                !(pending.modified == RulesetStatus::Unmodified && pending.is_empty())
            });
        }
        self.organizations.retain(|_, org| !org.is_empty());
    }
}
