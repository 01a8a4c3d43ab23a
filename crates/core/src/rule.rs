// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule and tag documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rule type, matching the types listed under the remote platform's rule
/// templates. Casing matches the wire format exactly, including the
/// lowercase-leading `kubernetesAudit`/`kubernetesConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleType {
    File,
    CloudTrail,
    Host,
    ThreatIntel,
    Winsec,
    #[serde(rename = "kubernetesAudit")]
    KubernetesAudit,
    #[serde(rename = "kubernetesConfig")]
    KubernetesConfig,
}

crate::simple_display! {
    RuleType {
        File => "File",
        CloudTrail => "CloudTrail",
        Host => "Host",
        ThreatIntel => "ThreatIntel",
        Winsec => "Winsec",
        KubernetesAudit => "kubernetesAudit",
        KubernetesConfig => "kubernetesConfig",
    }
}

/// Alert severity. The remote platform only accepts 1-3; encoding this as
/// an enum (rather than a raw `u8`) is type safety at the wire boundary,
/// not full schema validation — a malformed payload still round-trips
/// through `serde_json::Value` for every other field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Severity {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, thiserror::Error)]
#[error("severityOfAlerts must be 1, 2, or 3, got {0}")]
pub struct InvalidSeverity(u8);

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverity;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Severity::One),
            2 => Ok(Severity::Two),
            3 => Ok(Severity::Three),
            other => Err(InvalidSeverity(other)),
        }
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        value.as_u8()
    }
}

/// Rule inclusion/exclusion tag selectors, as persisted in `tags.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub inclusion: Vec<String>,
    #[serde(default)]
    pub exclusion: Vec<String>,
}

/// A rule's persisted `rule.json` document.
///
/// `extra` captures the opaque, type-specific fields the spec leaves
/// unvalidated — they're preserved verbatim on read/write/push but never
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(rename = "severityOfAlerts")]
    pub severity: Severity,
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

crate::builder! {
    pub struct RuleDocBuilder => RuleDoc {
        into { name: String = "test-rule" }
        set { rule_type: RuleType = RuleType::Host }
        set { severity: Severity = Severity::Two }
        set { enabled: bool = true }
        computed { extra: Map<String, Value> = Map::new() }
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
