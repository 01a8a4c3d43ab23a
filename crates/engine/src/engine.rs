// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state engine: the nine operations a user performs against one
//! organization, plus the three read-side accessors. Every mutating
//! operation follows "disk first, then state file" and, in eager mode,
//! triggers a `push` on return.

use std::sync::Arc;

use tsrm_core::{
    EngineError, IdGen, OrgId, RuleDoc, RuleId, RuleStatus, RulesetAction, RulesetDoc, RulesetId, Tags,
};
use tsrm_remote::RemoteClient;
use tsrm_storage::{add_rule, add_ruleset, del_rule, del_ruleset, fs_store, Mirror, StateStore};

use crate::error::store_err;
use crate::fanout::OrgLocks;
use crate::options::{EngineOptions, DEFAULT_NAME_COLLISION_POSTFIX};
use crate::reconcile;
use crate::views::{filter_matches, RuleListItem, RuleView, RuleViewFilter, RulesetListItem, RulesetView};

/// A state engine instance bound to one organization. Cheap to clone — every
/// field is a handle shared with sibling instances for other organizations
/// (`copyRuleOut`/`copyRulesetOut` construct one via [`Engine::engine_for`]).
#[derive(Clone)]
pub struct Engine {
    org: OrgId,
    mirror: Arc<Mirror>,
    store: Arc<StateStore>,
    id_gen: Arc<dyn IdGen>,
    remote: Arc<dyn RemoteClient>,
    options: EngineOptions,
    locks: OrgLocks,
}

impl Engine {
    pub fn new(
        org: OrgId,
        mirror: Arc<Mirror>,
        store: Arc<StateStore>,
        id_gen: Arc<dyn IdGen>,
        remote: Arc<dyn RemoteClient>,
        options: EngineOptions,
        locks: OrgLocks,
    ) -> Self {
        Self {
            org,
            mirror,
            store,
            id_gen,
            remote,
            options,
            locks,
        }
    }

    pub fn org(&self) -> &OrgId {
        &self.org
    }

    // ---- mutating operations ----

    pub async fn create_ruleset(&self, mut data: RulesetDoc, postfix: Option<&str>) -> Result<RulesetId, EngineError> {
        data.name = self.uniquify_ruleset_name(&data.name, postfix).await?;
        let id = self
            .mirror
            .create_ruleset(self.org.as_str(), self.id_gen.as_ref(), data)
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = id.clone();
        self.store
            .commit(move |state| add_ruleset(state, &org, &rid, RulesetAction::MarkModified))
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await?;
        Ok(id)
    }

    pub async fn update_ruleset(&self, ruleset_id: &RulesetId, data: &RulesetDoc) -> Result<(), EngineError> {
        self.mirror
            .edit_ruleset(self.org.as_str(), ruleset_id.as_str(), data)
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = ruleset_id.clone();
        self.store
            .commit(move |state| add_ruleset(state, &org, &rid, RulesetAction::MarkModified))
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await
    }

    pub async fn delete_ruleset(&self, ruleset_id: &RulesetId) -> Result<(), EngineError> {
        self.mirror
            .delete_ruleset(self.org.as_str(), ruleset_id.as_str())
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = ruleset_id.clone();
        let suffix = self.options.suffix.clone();
        self.store
            .commit(move |state| {
                del_ruleset(state, &org, &rid, &suffix);
                Ok(())
            })
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await
    }

    pub async fn create_rule(
        &self,
        ruleset_id: &RulesetId,
        mut rule: RuleDoc,
        tags: Tags,
        postfix: Option<&str>,
    ) -> Result<RuleId, EngineError> {
        rule.name = self.uniquify_rule_name(&rule.name, postfix).await?;
        let id = self
            .mirror
            .create_rule(self.org.as_str(), ruleset_id.as_str(), self.id_gen.as_ref(), rule, tags)
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rsid = ruleset_id.clone();
        let rid = id.clone();
        self.store
            .commit(move |state| add_rule(state, &org, &rsid, &rid, RuleStatus::Both))
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await?;
        Ok(id)
    }

    pub async fn update_rule(&self, rule_id: &RuleId, data: &RuleDoc) -> Result<(), EngineError> {
        let ruleset_id = self.locate_rule(rule_id).await?;
        self.mirror
            .edit_rule(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str(), data)
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = rule_id.clone();
        self.store
            .commit(move |state| add_rule(state, &org, &ruleset_id, &rid, RuleStatus::Rule))
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await
    }

    pub async fn update_tags(&self, rule_id: &RuleId, tags: &Tags) -> Result<(), EngineError> {
        let ruleset_id = self.locate_rule(rule_id).await?;
        self.mirror
            .edit_tags(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str(), tags)
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = rule_id.clone();
        self.store
            .commit(move |state| add_rule(state, &org, &ruleset_id, &rid, RuleStatus::Tags))
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await
    }

    pub async fn delete_rule(&self, rule_id: &RuleId) -> Result<(), EngineError> {
        let ruleset_id = self.locate_rule(rule_id).await?;
        self.mirror
            .delete_rule(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
            .await
            .map_err(store_err)?;

        let org = self.org.clone();
        let rid = rule_id.clone();
        let suffix = self.options.suffix.clone();
        self.store
            .commit(move |state| {
                del_rule(state, &org, &ruleset_id, &rid, &suffix);
                Ok(())
            })
            .await
            .map_err(store_err)?;

        self.maybe_eager_push().await
    }

    pub async fn copy_rule(&self, rule_id: &RuleId, dst_ruleset_id: &RulesetId, postfix: Option<&str>) -> Result<RuleId, EngineError> {
        let (rule, tags) = self.read_rule_and_tags(rule_id).await?;
        self.create_rule(dst_ruleset_id, rule, tags, postfix).await
    }

    pub async fn copy_rule_out(
        &self,
        rule_id: &RuleId,
        dst_ruleset_id: &RulesetId,
        dst_org: OrgId,
        postfix: Option<&str>,
    ) -> Result<RuleId, EngineError> {
        let (rule, tags) = self.read_rule_and_tags(rule_id).await?;
        let dst = self.engine_for(dst_org).await?;
        if !dst.mirror.locate_ruleset(dst.org.as_str(), dst_ruleset_id.as_str()).await {
            return Err(EngineError::NotFound(dst_ruleset_id.to_string()));
        }
        dst.create_rule(dst_ruleset_id, rule, tags, postfix).await
    }

    pub async fn copy_ruleset(&self, src_ruleset_id: &RulesetId, postfix: Option<&str>) -> Result<RulesetId, EngineError> {
        let dst = self.clone();
        self.copy_ruleset_to(src_ruleset_id, &dst, postfix).await
    }

    pub async fn copy_ruleset_out(
        &self,
        src_ruleset_id: &RulesetId,
        dst_org: OrgId,
        postfix: Option<&str>,
    ) -> Result<RulesetId, EngineError> {
        let dst = self.engine_for(dst_org).await?;
        self.copy_ruleset_to(src_ruleset_id, &dst, postfix).await
    }

    // ---- read accessors ----

    pub async fn list_hierarchy(&self) -> Result<Vec<RulesetListItem>, EngineError> {
        let mut out = Vec::new();
        for ruleset_id in self.mirror.list_ruleset_ids(self.org.as_str()).await.map_err(store_err)? {
            let doc = self.mirror.read_ruleset(self.org.as_str(), ruleset_id.as_str()).await.map_err(store_err)?;
            let mut rules = Vec::with_capacity(doc.rule_ids.len());
            for rule_id in &doc.rule_ids {
                let rule_doc = self
                    .mirror
                    .read_rule(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
                    .await
                    .map_err(store_err)?;
                rules.push(RuleListItem {
                    id: rule_id.clone(),
                    name: rule_doc.name,
                    rule_type: rule_doc.rule_type,
                });
            }
            out.push(RulesetListItem {
                id: ruleset_id,
                name: doc.name,
                rules,
            });
        }
        Ok(out)
    }

    pub async fn rulesets_view(&self) -> Result<Option<Vec<RulesetView>>, EngineError> {
        if self.mirror.is_refreshing(self.org.as_str()).await {
            return Ok(None);
        }
        let mut out = Vec::new();
        for ruleset_id in self.mirror.list_ruleset_ids(self.org.as_str()).await.map_err(store_err)? {
            let doc = self.mirror.read_ruleset(self.org.as_str(), ruleset_id.as_str()).await.map_err(store_err)?;
            out.push(RulesetView {
                id: ruleset_id,
                name: doc.name,
                description: doc.description,
                rule_ids: doc.rule_ids,
            });
        }
        Ok(Some(out))
    }

    pub async fn rules_view(&self, filter: &RuleViewFilter) -> Result<Option<Vec<RuleView>>, EngineError> {
        if self.mirror.is_refreshing(self.org.as_str()).await {
            return Ok(None);
        }
        let mut out = Vec::new();
        for ruleset_id in self.mirror.list_ruleset_ids(self.org.as_str()).await.map_err(store_err)? {
            for rule_id in self.mirror.list_rule_ids(self.org.as_str(), ruleset_id.as_str()).await.map_err(store_err)? {
                let doc = self
                    .mirror
                    .read_rule(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
                    .await
                    .map_err(store_err)?;
                if !filter_matches(filter, &rule_id, doc.rule_type, doc.severity) {
                    continue;
                }
                let tags = if filter.include_tags {
                    Some(
                        self.mirror
                            .read_tags(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
                            .await
                            .map_err(store_err)?,
                    )
                } else {
                    None
                };
                let extra = if filter.full_data { Some(doc.extra.clone()) } else { None };
                out.push(RuleView {
                    id: rule_id,
                    ruleset_id: ruleset_id.clone(),
                    name: doc.name,
                    rule_type: doc.rule_type,
                    severity: doc.severity,
                    enabled: doc.enabled,
                    tags,
                    extra,
                });
            }
        }
        Ok(Some(out))
    }

    pub async fn tags_for_rule(&self, rule_id: &RuleId) -> Result<Option<Tags>, EngineError> {
        if self.mirror.is_refreshing(self.org.as_str()).await {
            return Ok(None);
        }
        let Some(ruleset_id) = self.mirror.locate_rule(self.org.as_str(), rule_id.as_str()).await.map_err(store_err)? else {
            return Ok(None);
        };
        let tags = self
            .mirror
            .read_tags(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
            .await
            .map_err(store_err)?;
        Ok(Some(tags))
    }

    // ---- internals ----

    async fn locate_rule(&self, rule_id: &RuleId) -> Result<RulesetId, EngineError> {
        self.mirror
            .locate_rule(self.org.as_str(), rule_id.as_str())
            .await
            .map_err(store_err)?
            .ok_or_else(|| EngineError::NotFound(rule_id.to_string()))
    }

    async fn read_rule_and_tags(&self, rule_id: &RuleId) -> Result<(RuleDoc, Tags), EngineError> {
        let ruleset_id = self.locate_rule(rule_id).await?;
        let rule = self
            .mirror
            .read_rule(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
            .await
            .map_err(store_err)?;
        let tags = self
            .mirror
            .read_tags(self.org.as_str(), ruleset_id.as_str(), rule_id.as_str())
            .await
            .map_err(store_err)?;
        Ok((rule, tags))
    }

    async fn uniquify_ruleset_name(&self, name: &str, postfix: Option<&str>) -> Result<String, EngineError> {
        let postfix = postfix.unwrap_or(DEFAULT_NAME_COLLISION_POSTFIX);
        let mut candidate = name.to_string();
        while self
            .mirror
            .ruleset_name_occurs(self.org.as_str(), &candidate)
            .await
            .map_err(store_err)?
        {
            candidate.push_str(postfix);
        }
        Ok(candidate)
    }

    async fn uniquify_rule_name(&self, name: &str, postfix: Option<&str>) -> Result<String, EngineError> {
        let postfix = postfix.unwrap_or(DEFAULT_NAME_COLLISION_POSTFIX);
        let mut candidate = name.to_string();
        while self.mirror.rule_name_occurs(self.org.as_str(), &candidate).await.map_err(store_err)? {
            candidate.push_str(postfix);
        }
        Ok(candidate)
    }

    /// Build an `Engine` bound to `org`, triggering a refresh first if its
    /// directory is absent (used by `copyRuleOut`/`copyRulesetOut`).
    async fn engine_for(&self, org: OrgId) -> Result<Engine, EngineError> {
        let dst = Engine {
            org: org.clone(),
            mirror: self.mirror.clone(),
            store: self.store.clone(),
            id_gen: self.id_gen.clone(),
            remote: self.remote.clone(),
            options: self.options.clone(),
            locks: self.locks.clone(),
        };
        if !fs_store::exists(&dst.mirror.org_dir(org.as_str())).await {
            let _guard = dst.locks.acquire(&org).await;
            reconcile::refresh::refresh(&org, &dst.mirror, &dst.store, dst.remote.as_ref()).await?;
        }
        Ok(dst)
    }

    /// Copy `src_ruleset_id` (in `self`'s organization) into `dst`'s
    /// organization: name-uniquified ruleset and rules, identical payloads
    /// and tags, original untouched. Shared by `copyRuleset`/`copyRulesetOut`.
    async fn copy_ruleset_to(&self, src_ruleset_id: &RulesetId, dst: &Engine, postfix: Option<&str>) -> Result<RulesetId, EngineError> {
        let src_doc = self.mirror.read_ruleset(self.org.as_str(), src_ruleset_id.as_str()).await.map_err(store_err)?;
        let new_name = dst.uniquify_ruleset_name(&src_doc.name, postfix).await?;
        let new_ruleset_id = dst
            .mirror
            .create_ruleset(
                dst.org.as_str(),
                dst.id_gen.as_ref(),
                RulesetDoc {
                    name: new_name,
                    description: src_doc.description.clone(),
                    rule_ids: Vec::new(),
                },
            )
            .await
            .map_err(store_err)?;

        let mut new_rule_ids = Vec::with_capacity(src_doc.rule_ids.len());
        for rule_id in &src_doc.rule_ids {
            let mut rule = self
                .mirror
                .read_rule(self.org.as_str(), src_ruleset_id.as_str(), rule_id.as_str())
                .await
                .map_err(store_err)?;
            let tags = self
                .mirror
                .read_tags(self.org.as_str(), src_ruleset_id.as_str(), rule_id.as_str())
                .await
                .map_err(store_err)?;
            rule.name = dst.uniquify_rule_name(&rule.name, postfix).await?;
            let new_rule_id = dst
                .mirror
                .create_rule(dst.org.as_str(), new_ruleset_id.as_str(), dst.id_gen.as_ref(), rule, tags)
                .await
                .map_err(store_err)?;
            new_rule_ids.push(new_rule_id);
        }

        let org = dst.org.clone();
        let rsid = new_ruleset_id.clone();
        let rule_entries = new_rule_ids.clone();
        dst.store
            .commit(move |state| {
                add_ruleset(state, &org, &rsid, RulesetAction::MarkModified)?;
                for rid in &rule_entries {
                    add_rule(state, &org, &rsid, rid, RuleStatus::Both)?;
                }
                Ok(())
            })
            .await
            .map_err(store_err)?;

        dst.maybe_eager_push().await?;
        Ok(new_ruleset_id)
    }

    async fn maybe_eager_push(&self) -> Result<(), EngineError> {
        if !self.options.eager_push {
            return Ok(());
        }
        let _guard = self.locks.acquire(&self.org).await;
        reconcile::push::push(&self.org, &self.mirror, &self.store, self.remote.as_ref(), &self.options.suffix).await
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
