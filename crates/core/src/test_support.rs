// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `proptest` strategies for the rule/ruleset invariants, gated behind the
//! `test-support` feature so other crates can exercise them in their own
//! tests without pulling `proptest` into production builds.

use proptest::prelude::*;

use crate::rule::{RuleType, Severity};
use crate::status::{RuleStatus, RulesetAction};

pub fn arb_rule_type() -> impl Strategy<Value = RuleType> {
    prop_oneof![
        Just(RuleType::File),
        Just(RuleType::CloudTrail),
        Just(RuleType::Host),
        Just(RuleType::ThreatIntel),
        Just(RuleType::Winsec),
        Just(RuleType::KubernetesAudit),
        Just(RuleType::KubernetesConfig),
    ]
}

pub fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![Just(Severity::One), Just(Severity::Two), Just(Severity::Three)]
}

/// Non-`del` endpoints: `addRule`'s callers never pass `del` as a join
/// endpoint (deletion is its own primitive).
pub fn arb_rule_join_endpoint() -> impl Strategy<Value = RuleStatus> {
    prop_oneof![Just(RuleStatus::Rule), Just(RuleStatus::Tags), Just(RuleStatus::Both)]
}

pub fn arb_ruleset_action() -> impl Strategy<Value = RulesetAction> {
    prop_oneof![Just(RulesetAction::MarkModified), Just(RulesetAction::MarkUnmodified)]
}

/// A short, ASCII, non-empty name usable as a rule/ruleset `name` field.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}".prop_map(|s| s.to_string())
}
