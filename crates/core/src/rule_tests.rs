// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn severity_round_trips_as_integer() {
    let json = serde_json::to_string(&Severity::Two).unwrap();
    assert_eq!(json, "2");
    let back: Severity = serde_json::from_str("2").unwrap();
    assert_eq!(back, Severity::Two);
}

#[test]
fn severity_out_of_range_is_rejected() {
    let err = serde_json::from_str::<Severity>("4");
    assert!(err.is_err());
}

#[test]
fn rule_type_matches_wire_casing() {
    assert_eq!(serde_json::to_string(&RuleType::KubernetesAudit).unwrap(), "\"kubernetesAudit\"");
    assert_eq!(serde_json::to_string(&RuleType::CloudTrail).unwrap(), "\"CloudTrail\"");
}

#[test]
fn rule_doc_preserves_opaque_fields() {
    let raw = serde_json::json!({
        "name": "suspicious-login",
        "type": "Host",
        "severityOfAlerts": 3,
        "enabled": true,
        "aggregateFields": ["hostname"],
        "filter": "process = sshd"
    });
    let doc: RuleDoc = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(doc.name, "suspicious-login");
    assert_eq!(doc.severity, Severity::Three);
    assert_eq!(doc.extra.get("filter").unwrap(), "process = sshd");

    let back = serde_json::to_value(&doc).unwrap();
    assert_eq!(back, raw);
}

#[test]
fn builder_produces_default_rule() {
    let rule = RuleDoc::builder().name("r1").build();
    assert_eq!(rule.name, "r1");
    assert_eq!(rule.rule_type, RuleType::Host);
    assert!(rule.enabled);
}
