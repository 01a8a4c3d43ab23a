// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity change-status lattices.
//!
//! `del` is terminal and absorbing for both lattices: once an entity is
//! marked deleted, any further attempt to modify it is an
//! [`InvariantViolation`](crate::error::EngineError::InvariantViolation),
//! not a silent no-op.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LatticeError {
    #[error("cannot modify a rule or ruleset already marked for deletion")]
    ModifyDeleted,
    #[error("cannot unmodify a ruleset once it has been marked modified")]
    Unmodify,
}

/// Status of a rule that exists (or will exist) on the remote platform.
/// `Both` is the join of `Rule` and `Tags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Rule,
    Tags,
    Both,
    Del,
}

impl RuleStatus {
    /// Monotone join of the current status with a newly-requested endpoint.
    /// `endpoint` is never `Del` here — deletion goes through its own
    /// state-file primitive, not a join.
    pub fn join(self, endpoint: RuleStatus) -> Result<RuleStatus, LatticeError> {
        use RuleStatus::*;
        if self == Del {
            return Err(LatticeError::ModifyDeleted);
        }
        Ok(match (self, endpoint) {
            (a, b) if a == b => a,
            (Both, _) | (_, Both) => Both,
            (Rule, Tags) | (Tags, Rule) => Both,
            (_, Del) => return Err(LatticeError::ModifyDeleted),
        })
    }
}

/// Status of a ruleset that exists (or will exist) on the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulesetStatus {
    #[serde(rename = "true")]
    Modified,
    #[serde(rename = "false")]
    Unmodified,
    #[serde(rename = "del")]
    Del,
}

/// The two user-facing actions `addRuleset` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesetAction {
    MarkModified,
    MarkUnmodified,
}

impl RulesetStatus {
    pub fn transition(self, action: RulesetAction) -> Result<RulesetStatus, LatticeError> {
        use RulesetAction::*;
        use RulesetStatus::*;
        match (self, action) {
            (Del, _) => Err(LatticeError::ModifyDeleted),
            (Unmodified, MarkModified) => Ok(Modified),
            (Modified, MarkUnmodified) => Err(LatticeError::Unmodify),
            (s, _) => Ok(s),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
