// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem mirror primitives: the per-organization directory tree of
//! `ruleset.json` / `rule.json` / `tags.json` documents.
//!
//! `locateRule`/`locateRuleset` derive a rule's parent from the filesystem
//! by scanning sibling directories rather than indexing in memory — rule
//! IDs are globally unique within an organization, so a linear scan over
//! the (typically small) set of rulesets is sufficient.

use std::path::{Path, PathBuf};

use tsrm_core::{IdGen, RuleDoc, RuleId, RulesetDoc, RulesetId, Tags};

use crate::error::StoreError;
use crate::fs_store;

/// Transient staging directories created by refresh; never treated as
/// ruleset directories by the scan helpers below.
pub const STAGING_DIRS: [&str; 2] = [".backup", ".remote"];

/// Per-organization directory tree.
pub struct Mirror {
    state_dir: PathBuf,
    local_only_suffix: String,
}

impl Mirror {
    pub fn new(state_dir: impl Into<PathBuf>, local_only_suffix: impl Into<String>) -> Self {
        Self {
            state_dir: state_dir.into(),
            local_only_suffix: local_only_suffix.into(),
        }
    }

    pub fn org_dir(&self, org: &str) -> PathBuf {
        self.state_dir.join(org)
    }

    pub fn ruleset_dir(&self, org: &str, ruleset_id: &str) -> PathBuf {
        self.org_dir(org).join(ruleset_id)
    }

    pub fn rule_dir(&self, org: &str, ruleset_id: &str, rule_id: &str) -> PathBuf {
        self.ruleset_dir(org, ruleset_id).join(rule_id)
    }

    fn new_local_id(&self, id_gen: &dyn IdGen) -> String {
        format!("{}{}", id_gen.new_uuid(), self.local_only_suffix)
    }

    pub async fn ensure_org_dir(&self, org: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(self.org_dir(org)).await?;
        Ok(())
    }

    /// `createRuleset(data) → new_local_id`. The ruleset begins with no
    /// rules; `createRule` appends to `ruleIds` as rules are added.
    pub async fn create_ruleset(
        &self,
        org: &str,
        id_gen: &dyn IdGen,
        mut data: RulesetDoc,
    ) -> Result<RulesetId, StoreError> {
        let id = RulesetId::from(self.new_local_id(id_gen));
        data.rule_ids.clear();
        let dir = self.ruleset_dir(org, id.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        fs_store::write(&dir.join("ruleset.json"), &data).await?;
        Ok(id)
    }

    /// `editRuleset(id, data)` — overwrite `ruleset.json` in place.
    pub async fn edit_ruleset(&self, org: &str, ruleset_id: &str, data: &RulesetDoc) -> Result<(), StoreError> {
        let path = self.ruleset_dir(org, ruleset_id).join("ruleset.json");
        if !fs_store::exists(&path).await {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        fs_store::write(&path, data).await
    }

    pub async fn read_ruleset(&self, org: &str, ruleset_id: &str) -> Result<RulesetDoc, StoreError> {
        fs_store::read(&self.ruleset_dir(org, ruleset_id).join("ruleset.json")).await
    }

    /// `deleteRuleset(id)` — recursive rmdir.
    pub async fn delete_ruleset(&self, org: &str, ruleset_id: &str) -> Result<(), StoreError> {
        remove_dir_all_checked(&self.ruleset_dir(org, ruleset_id)).await
    }

    /// `createRule(ruleset_id, rule, tags) → new_local_id`. Writes both
    /// JSON documents and appends the new ID to the parent's `ruleIds`.
    pub async fn create_rule(
        &self,
        org: &str,
        ruleset_id: &str,
        id_gen: &dyn IdGen,
        rule: RuleDoc,
        tags: Tags,
    ) -> Result<RuleId, StoreError> {
        let id = RuleId::from(self.new_local_id(id_gen));
        let dir = self.rule_dir(org, ruleset_id, id.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        fs_store::write(&dir.join("rule.json"), &rule).await?;
        fs_store::write(&dir.join("tags.json"), &tags).await?;

        let rs_path = self.ruleset_dir(org, ruleset_id).join("ruleset.json");
        let mut rs_doc: RulesetDoc = fs_store::read(&rs_path).await?;
        rs_doc.rule_ids.push(id.clone());
        fs_store::write(&rs_path, &rs_doc).await?;
        Ok(id)
    }

    /// `editRule(id, data)` — overwrite `rule.json`.
    pub async fn edit_rule(&self, org: &str, ruleset_id: &str, rule_id: &str, data: &RuleDoc) -> Result<(), StoreError> {
        let path = self.rule_dir(org, ruleset_id, rule_id).join("rule.json");
        if !fs_store::exists(&path).await {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        fs_store::write(&path, data).await
    }

    /// Overwrite `tags.json` (the `updateTags` engine operation's mirror step).
    pub async fn edit_tags(&self, org: &str, ruleset_id: &str, rule_id: &str, data: &Tags) -> Result<(), StoreError> {
        let path = self.rule_dir(org, ruleset_id, rule_id).join("tags.json");
        if !fs_store::exists(&path).await {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        fs_store::write(&path, data).await
    }

    pub async fn read_rule(&self, org: &str, ruleset_id: &str, rule_id: &str) -> Result<RuleDoc, StoreError> {
        fs_store::read(&self.rule_dir(org, ruleset_id, rule_id).join("rule.json")).await
    }

    pub async fn read_tags(&self, org: &str, ruleset_id: &str, rule_id: &str) -> Result<Tags, StoreError> {
        fs_store::read(&self.rule_dir(org, ruleset_id, rule_id).join("tags.json")).await
    }

    /// `deleteRule(id)` — rmdir and remove the ID from the parent's
    /// `ruleIds`.
    pub async fn delete_rule(&self, org: &str, ruleset_id: &str, rule_id: &str) -> Result<(), StoreError> {
        remove_dir_all_checked(&self.rule_dir(org, ruleset_id, rule_id)).await?;

        let rs_path = self.ruleset_dir(org, ruleset_id).join("ruleset.json");
        let mut rs_doc: RulesetDoc = fs_store::read(&rs_path).await?;
        rs_doc.rule_ids.retain(|id| id.as_str() != rule_id);
        fs_store::write(&rs_path, &rs_doc).await
    }

    /// `locateRule(rule_id) → ruleset_id or ∅` — scan sibling ruleset
    /// directories for one containing `rule_id`.
    pub async fn locate_rule(&self, org: &str, rule_id: &str) -> Result<Option<RulesetId>, StoreError> {
        for ruleset_id in self.list_ruleset_ids(org).await? {
            if fs_store::exists(&self.rule_dir(org, ruleset_id.as_str(), rule_id)).await {
                return Ok(Some(ruleset_id));
            }
        }
        Ok(None)
    }

    /// `locateRuleset(ruleset_id)` — true if the ruleset directory exists
    /// (its path is deterministic from the ID, unlike a rule's parent).
    pub async fn locate_ruleset(&self, org: &str, ruleset_id: &str) -> bool {
        fs_store::exists(&self.ruleset_dir(org, ruleset_id).join("ruleset.json")).await
    }

    /// `rulesetNameOccurs(name)` — linear scan of every ruleset in the
    /// organization.
    pub async fn ruleset_name_occurs(&self, org: &str, name: &str) -> Result<bool, StoreError> {
        for ruleset_id in self.list_ruleset_ids(org).await? {
            let doc = self.read_ruleset(org, ruleset_id.as_str()).await?;
            if doc.name == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `ruleNameOccurs(name)` — linear scan of every rule under every
    /// ruleset in the organization.
    pub async fn rule_name_occurs(&self, org: &str, name: &str) -> Result<bool, StoreError> {
        for ruleset_id in self.list_ruleset_ids(org).await? {
            for rule_id in self.list_rule_ids(org, ruleset_id.as_str()).await? {
                let doc = self.read_rule(org, ruleset_id.as_str(), rule_id.as_str()).await?;
                if doc.name == name {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Ruleset directory names under an organization, excluding the
    /// transient refresh-staging directories.
    pub async fn list_ruleset_ids(&self, org: &str) -> Result<Vec<RulesetId>, StoreError> {
        list_subdirs(&self.org_dir(org))
            .await
            .map(|names| names.into_iter().map(RulesetId::from).collect())
    }

    /// Rule directory names under a ruleset, as persisted in `ruleset.json`
    /// (the source of truth for membership order).
    pub async fn list_rule_ids(&self, org: &str, ruleset_id: &str) -> Result<Vec<RuleId>, StoreError> {
        Ok(self.read_ruleset(org, ruleset_id).await?.rule_ids)
    }

    /// Rename a rule's directory after push materializes a remote ID.
    pub async fn rename_rule(&self, org: &str, ruleset_id: &str, old_id: &str, new_id: &str) -> Result<(), StoreError> {
        let from = self.rule_dir(org, ruleset_id, old_id);
        let to = self.rule_dir(org, ruleset_id, new_id);
        tokio::fs::rename(&from, &to).await?;
        Ok(())
    }

    /// Rename a ruleset's directory after push materializes a remote ID.
    pub async fn rename_ruleset(&self, org: &str, old_id: &str, new_id: &str) -> Result<(), StoreError> {
        let from = self.ruleset_dir(org, old_id);
        let to = self.ruleset_dir(org, new_id);
        tokio::fs::rename(&from, &to).await?;
        Ok(())
    }

    /// True while `.remote/` is present — a refresh is mid-flight. Engine
    /// queries must refuse while true.
    pub async fn is_refreshing(&self, org: &str) -> bool {
        fs_store::exists(&self.remote_dir(org)).await
    }

    fn backup_dir(&self, org: &str) -> PathBuf {
        self.org_dir(org).join(".backup")
    }

    fn remote_dir(&self, org: &str) -> PathBuf {
        self.org_dir(org).join(".remote")
    }

    pub async fn backup_dir_exists(&self, org: &str) -> bool {
        fs_store::exists(&self.backup_dir(org)).await
    }

    pub async fn remove_remote_staging(&self, org: &str) -> Result<(), StoreError> {
        remove_dir_all_ignore_missing(&self.remote_dir(org)).await
    }

    pub async fn remove_backup_staging(&self, org: &str) -> Result<(), StoreError> {
        remove_dir_all_ignore_missing(&self.backup_dir(org)).await
    }

    /// Step 2 of refresh: create fresh `.backup/`/`.remote/` and move every
    /// non-staging child of the organization directory into `.backup/`.
    pub async fn stage_for_refresh(&self, org: &str) -> Result<(), StoreError> {
        self.ensure_org_dir(org).await?;
        tokio::fs::create_dir_all(self.backup_dir(org)).await?;
        tokio::fs::create_dir_all(self.remote_dir(org)).await?;
        for name in list_subdirs(&self.org_dir(org)).await? {
            tokio::fs::rename(self.org_dir(org).join(&name), self.backup_dir(org).join(&name)).await?;
        }
        Ok(())
    }

    /// Move every child of `.backup/` back into the organization directory
    /// and remove `.backup/` (refresh crash-recovery and failure rollback).
    pub async fn restore_from_backup(&self, org: &str) -> Result<(), StoreError> {
        let backup = self.backup_dir(org);
        let mut entries = match tokio::fs::read_dir(&backup).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            tokio::fs::rename(entry.path(), self.org_dir(org).join(&name)).await?;
        }
        self.remove_backup_staging(org).await
    }

    /// Move every child of `.remote/` into the organization directory and
    /// remove both staging directories (refresh success, step 5).
    pub async fn promote_remote_staging(&self, org: &str) -> Result<(), StoreError> {
        let remote = self.remote_dir(org);
        let mut entries = tokio::fs::read_dir(&remote).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            tokio::fs::rename(entry.path(), self.org_dir(org).join(&name)).await?;
        }
        self.remove_remote_staging(org).await?;
        self.remove_backup_staging(org).await
    }

    /// Write a fetched ruleset into `.remote/<ruleset_id>/ruleset.json`
    /// (refresh step 3).
    pub async fn write_remote_ruleset(&self, org: &str, ruleset_id: &str, data: &RulesetDoc) -> Result<(), StoreError> {
        let dir = self.remote_dir(org).join(ruleset_id);
        tokio::fs::create_dir_all(&dir).await?;
        fs_store::write(&dir.join("ruleset.json"), data).await
    }

    /// Write a fetched rule into
    /// `.remote/<ruleset_id>/<rule_id>/{rule,tags}.json` (refresh step 3).
    pub async fn write_remote_rule(
        &self,
        org: &str,
        ruleset_id: &str,
        rule_id: &str,
        rule: &RuleDoc,
        tags: &Tags,
    ) -> Result<(), StoreError> {
        let dir = self.remote_dir(org).join(ruleset_id).join(rule_id);
        tokio::fs::create_dir_all(&dir).await?;
        fs_store::write(&dir.join("rule.json"), rule).await?;
        fs_store::write(&dir.join("tags.json"), tags).await
    }
}

async fn list_subdirs(dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if STAGING_DIRS.contains(&name.as_str()) {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

async fn remove_dir_all_checked(dir: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(dir.display().to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn remove_dir_all_ignore_missing(dir: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write `.gitignore` listing the state file, once, when the state
/// directory is first initialized. A storage-layer initialization step,
/// not a git integration.
pub async fn ensure_gitignore(state_dir: &Path, state_file_name: &str) -> Result<(), StoreError> {
    let path = state_dir.join(".gitignore");
    if fs_store::exists(&path).await {
        return Ok(());
    }
    tokio::fs::create_dir_all(state_dir).await?;
    tokio::fs::write(&path, format!("{state_file_name}\n")).await?;
    Ok(())
}

#[cfg(test)]
#[path = "mirror_tests.rs"]
mod tests;
