// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ruleset documents.

use serde::{Deserialize, Serialize};

use crate::ids::RuleId;

/// A ruleset's persisted `ruleset.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetDoc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "ruleIds", default)]
    pub rule_ids: Vec<RuleId>,
}

crate::builder! {
    pub struct RulesetDocBuilder => RulesetDoc {
        into { name: String = "test-ruleset" }
        into { description: String = "" }
        computed { rule_ids: Vec<RuleId> = Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_rule_ids() {
        let doc = RulesetDoc {
            name: "n".into(),
            description: "d".into(),
            rule_ids: vec![RuleId::from("r1"), RuleId::from("r2")],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["ruleIds"], serde_json::json!(["r1", "r2"]));
        let back: RulesetDoc = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn builder_defaults() {
        let rs = RulesetDoc::builder().name("copy-me").build();
        assert_eq!(rs.name, "copy-me");
        assert!(rs.rule_ids.is_empty());
    }
}
