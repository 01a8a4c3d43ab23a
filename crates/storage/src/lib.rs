// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The JSON file store, the state-file transitions, and the filesystem
//! mirror — the on-disk half of the state engine.

pub mod error;
pub mod fs_store;
pub mod mirror;
pub mod state_file;

pub use error::StoreError;
pub use mirror::{ensure_gitignore, Mirror};
pub use state_file::{add_org, add_rule, add_ruleset, del_org, del_rule, del_ruleset, StateStore};
