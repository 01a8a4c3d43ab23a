// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifiers for organizations, rulesets, and rules, and the
//! local-only ID generation capability.
//!
//! Remote-platform IDs are arbitrary-length opaque strings and local-only
//! IDs are a UUID plus a configurable suffix, so these newtypes wrap
//! `String` directly rather than a fixed-width buffer.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default suffix marking a ruleset or rule as not yet pushed to the
/// remote platform. Overridable via [`crate::EngineOptions::postfix`].
pub const DEFAULT_LOCAL_ONLY_SUFFIX: &str = "-localonly";

/// Define an opaque, `String`-backed ID newtype.
macro_rules! define_string_id {
    ($(#[$meta:meta])* pub struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }

            /// True if this ID carries the local-only suffix.
            pub fn is_local_only(&self, suffix: &str) -> bool {
                self.0.ends_with(suffix)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self(s.clone())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_string_id! {
    /// Opaque organization/tenant identifier.
    pub struct OrgId;
}

define_string_id! {
    /// Opaque ruleset identifier (remote-assigned, or a local-only UUID + suffix).
    pub struct RulesetId;
}

define_string_id! {
    /// Opaque rule identifier (remote-assigned, or a local-only UUID + suffix).
    pub struct RuleId;
}

/// Random ID generation, abstracted so push/refresh tests can be
/// deterministic — a real/fake split applied to ID generation instead of
/// time.
pub trait IdGen: Send + Sync {
    /// Generate a fresh random UUID string (no suffix attached).
    fn new_uuid(&self) -> String;
}

/// Real UUIDv4 generator.
#[derive(Debug, Clone, Default)]
pub struct SystemIdGen;

impl IdGen for SystemIdGen {
    fn new_uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests: produces `id-0`, `id-1`, ... in order.
#[derive(Debug, Default)]
pub struct FakeIdGen {
    counter: AtomicU64,
}

impl FakeIdGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGen for FakeIdGen {
    fn new_uuid(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("id-{n:08}")
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
