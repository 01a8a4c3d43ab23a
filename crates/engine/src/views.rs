// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side data shapes for the hierarchy/ruleset/rule/tag listing
//! accessors. These back an out-of-scope CLI/HTTP facade; they don't
//! affect push/refresh semantics or the state-file schema.

use serde_json::{Map, Value};
use tsrm_core::{RuleId, RuleType, RulesetId, Severity, Tags};

/// One rule as listed under its parent ruleset by [`crate::Engine::list_hierarchy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleListItem {
    pub id: RuleId,
    pub name: String,
    pub rule_type: RuleType,
}

/// One ruleset and its rules, as returned by `State.lst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetListItem {
    pub id: RulesetId,
    pub name: String,
    pub rules: Vec<RuleListItem>,
}

/// A ruleset row as returned by `State.lst_api_rulesets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetView {
    pub id: RulesetId,
    pub name: String,
    pub description: String,
    pub rule_ids: Vec<RuleId>,
}

/// A rule row as returned by `State.lst_api_rules`. `tags`/`extra` are
/// populated only when the matching filter flag requests them.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleView {
    pub id: RuleId,
    pub ruleset_id: RulesetId,
    pub name: String,
    pub rule_type: RuleType,
    pub severity: Severity,
    pub enabled: bool,
    pub tags: Option<Tags>,
    pub extra: Option<Map<String, Value>>,
}

/// Filters accepted by `rules_view` (`State.lst_api_rules`'s keyword
/// arguments).
#[derive(Debug, Clone, Default)]
pub struct RuleViewFilter {
    pub rule_ids: Option<Vec<RuleId>>,
    pub severity: Option<Severity>,
    pub rule_type: Option<RuleType>,
    pub include_tags: bool,
    pub full_data: bool,
}

impl RuleViewFilter {
    fn matches(&self, id: &RuleId, rule_type: RuleType, severity: Severity) -> bool {
        if let Some(ids) = &self.rule_ids {
            if !ids.contains(id) {
                return false;
            }
        }
        if let Some(want) = self.severity {
            if want != severity {
                return false;
            }
        }
        if let Some(want) = self.rule_type {
            if want != rule_type {
                return false;
            }
        }
        true
    }
}

pub(crate) fn filter_matches(filter: &RuleViewFilter, id: &RuleId, rule_type: RuleType, severity: Severity) -> bool {
    filter.matches(id, rule_type, severity)
}
