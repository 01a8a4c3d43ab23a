// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push: local → remote, one organization. Every remote call is
//! independently try/continue — a failure leaves its entry pending for
//! the next push rather than poisoning the rest of the organization. The
//! state file is written exactly once, at the end of the pass.

use indexmap::IndexMap;
use tsrm_core::{EngineError, OrgId, OrgPending, RuleId, RuleStatus, RulesetDoc, RulesetId, RulesetPending, RulesetStatus};
use tsrm_remote::RemoteClient;
use tsrm_storage::Mirror;
use tsrm_storage::StateStore;

use crate::error::store_err;

pub async fn push(
    org: &OrgId,
    mirror: &Mirror,
    store: &StateStore,
    remote: &dyn RemoteClient,
    suffix: &str,
) -> Result<(), EngineError> {
    let snapshot = store.load().await.map_err(store_err)?;
    let Some(org_pending) = snapshot.organizations.get(org).cloned() else {
        return Ok(());
    };

    let mut remaining: OrgPending = IndexMap::new();
    for (ruleset_id, pending) in org_pending {
        match push_ruleset(org, &ruleset_id, pending, mirror, remote, suffix).await? {
            RulesetOutcome::Drop => {}
            RulesetOutcome::Keep(id, pending) => {
                if !(pending.modified == RulesetStatus::Unmodified && pending.rule_ids.is_empty()) {
                    remaining.insert(id, pending);
                }
            }
        }
    }

    let org = org.clone();
    store
        .commit(move |state| {
            if remaining.is_empty() {
                state.organizations.shift_remove(&org);
            } else {
                state.organizations.insert(org.clone(), remaining);
            }
            Ok(())
        })
        .await
        .map_err(store_err)?;

    Ok(())
}

enum RulesetOutcome {
    Drop,
    Keep(RulesetId, RulesetPending),
}

async fn push_ruleset(
    org: &OrgId,
    ruleset_id: &RulesetId,
    pending: RulesetPending,
    mirror: &Mirror,
    remote: &dyn RemoteClient,
    suffix: &str,
) -> Result<RulesetOutcome, EngineError> {
    if pending.modified == RulesetStatus::Del {
        return match remote.delete_ruleset(ruleset_id.as_str()).await {
            Ok(()) => Ok(RulesetOutcome::Drop),
            Err(e) => {
                tracing::warn!(org = %org, ruleset_id = %ruleset_id, error = %e, "push: ruleset delete failed, will retry");
                Ok(RulesetOutcome::Keep(ruleset_id.clone(), pending))
            }
        };
    }

    if ruleset_id.is_local_only(suffix) {
        push_local_only_ruleset(org, ruleset_id, pending, mirror, remote).await
    } else {
        push_existing_ruleset(org, ruleset_id, pending, mirror, remote, suffix).await
    }
}

/// Case (2): a never-pushed ruleset. POST it, materialize its local-only
/// children, and rename both ruleset and rule directories to their
/// remote-assigned IDs.
async fn push_local_only_ruleset(
    org: &OrgId,
    local_id: &RulesetId,
    pending: RulesetPending,
    mirror: &Mirror,
    remote: &dyn RemoteClient,
) -> Result<RulesetOutcome, EngineError> {
    let doc = mirror.read_ruleset(org.as_str(), local_id.as_str()).await.map_err(store_err)?;
    let mut payload = doc.clone();
    payload.rule_ids.clear();

    let new_ruleset_id = match remote.post_ruleset(&payload).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(org = %org, ruleset_id = %local_id, error = %e, "push: ruleset create failed, will retry");
            return Ok(RulesetOutcome::Keep(local_id.clone(), pending));
        }
    };

    let local_children = doc.rule_ids.clone();
    let (new_rule_ids, remaining_rules) = push_local_children(
        org,
        local_id.as_str(),
        &new_ruleset_id,
        local_children,
        &pending.rule_ids,
        mirror,
        remote,
    )
    .await?;

    mirror
        .rename_ruleset(org.as_str(), local_id.as_str(), &new_ruleset_id)
        .await
        .map_err(store_err)?;
    let final_doc = RulesetDoc {
        rule_ids: new_rule_ids,
        ..doc
    };
    mirror
        .edit_ruleset(org.as_str(), &new_ruleset_id, &final_doc)
        .await
        .map_err(store_err)?;

    if remaining_rules.is_empty() {
        Ok(RulesetOutcome::Drop)
    } else {
        Ok(RulesetOutcome::Keep(
            RulesetId::from(new_ruleset_id),
            RulesetPending {
                modified: RulesetStatus::Unmodified,
                rule_ids: remaining_rules,
            },
        ))
    }
}

/// Case (3): a ruleset that already exists remotely. PUT it if modified,
/// materialize any local-only children added since the last push, then
/// dispatch the remaining remote-tracked rule entries by status.
async fn push_existing_ruleset(
    org: &OrgId,
    ruleset_id: &RulesetId,
    mut pending: RulesetPending,
    mirror: &Mirror,
    remote: &dyn RemoteClient,
    suffix: &str,
) -> Result<RulesetOutcome, EngineError> {
    let doc = mirror.read_ruleset(org.as_str(), ruleset_id.as_str()).await.map_err(store_err)?;
    let local_only_ids: Vec<RuleId> = doc.rule_ids.iter().filter(|id| id.is_local_only(suffix)).cloned().collect();

    if pending.modified == RulesetStatus::Modified {
        let remote_only: Vec<RuleId> = doc.rule_ids.iter().filter(|id| !id.is_local_only(suffix)).cloned().collect();
        let payload = RulesetDoc {
            rule_ids: remote_only,
            ..doc.clone()
        };
        match remote.put_ruleset(ruleset_id.as_str(), &payload).await {
            Ok(()) => pending.modified = RulesetStatus::Unmodified,
            Err(e) => {
                tracing::warn!(org = %org, ruleset_id = %ruleset_id, error = %e, "push: ruleset update failed, will retry");
            }
        }
    }

    let (materialized_ids, mut final_rules) = push_local_children(
        org,
        ruleset_id.as_str(),
        ruleset_id.as_str(),
        local_only_ids,
        &pending.rule_ids,
        mirror,
        remote,
    )
    .await?;

    let mut materialized = materialized_ids.into_iter();
    let final_rule_ids: Vec<RuleId> = doc
        .rule_ids
        .iter()
        .map(|id| {
            if id.is_local_only(suffix) {
                materialized
                    .next()
                    .unwrap_or_else(|| id.clone())
            } else {
                id.clone()
            }
        })
        .collect();
    let final_doc = RulesetDoc {
        rule_ids: final_rule_ids,
        ..doc
    };
    mirror
        .edit_ruleset(org.as_str(), ruleset_id.as_str(), &final_doc)
        .await
        .map_err(store_err)?;

    for (rule_id, status) in pending.rule_ids.iter() {
        if rule_id.is_local_only(suffix) {
            continue;
        }
        if let Some(new_status) = dispatch_remote_rule(org, ruleset_id.as_str(), rule_id, *status, mirror, remote).await? {
            final_rules.insert(rule_id.clone(), new_status);
        }
    }

    if pending.modified == RulesetStatus::Unmodified && final_rules.is_empty() {
        Ok(RulesetOutcome::Drop)
    } else {
        Ok(RulesetOutcome::Keep(
            ruleset_id.clone(),
            RulesetPending {
                modified: pending.modified,
                rule_ids: final_rules,
            },
        ))
    }
}

/// POST each local-only rule under `target_ruleset_id`, renaming its
/// directory (still nested under `local_ruleset_dir`) to the returned ID,
/// then POST its tags. Returns the final ordered rule-ID list (materialized
/// IDs substituted in) and the pending-status map for rules still owing
/// remote work.
async fn push_local_children(
    org: &OrgId,
    local_ruleset_dir: &str,
    target_ruleset_id: &str,
    ordered_ids: Vec<RuleId>,
    pending_rule_ids: &IndexMap<RuleId, RuleStatus>,
    mirror: &Mirror,
    remote: &dyn RemoteClient,
) -> Result<(Vec<RuleId>, IndexMap<RuleId, RuleStatus>), EngineError> {
    let mut final_ids = Vec::with_capacity(ordered_ids.len());
    let mut remaining = IndexMap::new();

    for old_id in ordered_ids {
        let status = pending_rule_ids.get(&old_id).copied().unwrap_or(RuleStatus::Both);
        let rule_doc = mirror
            .read_rule(org.as_str(), local_ruleset_dir, old_id.as_str())
            .await
            .map_err(store_err)?;

        match remote.post_rule(target_ruleset_id, &rule_doc).await {
            Err(e) => {
                tracing::warn!(org = %org, rule_id = %old_id, error = %e, "push: rule create failed, will retry");
                final_ids.push(old_id.clone());
                remaining.insert(old_id, status);
            }
            Ok(new_rule_id) => {
                mirror
                    .rename_rule(org.as_str(), local_ruleset_dir, old_id.as_str(), &new_rule_id)
                    .await
                    .map_err(store_err)?;
                let new_rule_id = RuleId::from(new_rule_id);
                final_ids.push(new_rule_id.clone());

                let tags = mirror
                    .read_tags(org.as_str(), local_ruleset_dir, new_rule_id.as_str())
                    .await
                    .map_err(store_err)?;
                if let Err(e) = remote.post_tags(new_rule_id.as_str(), &tags).await {
                    tracing::warn!(org = %org, rule_id = %new_rule_id, error = %e, "push: tags create failed, will retry");
                    remaining.insert(new_rule_id, RuleStatus::Tags);
                }
            }
        }
    }

    Ok((final_ids, remaining))
}

async fn dispatch_remote_rule(
    org: &OrgId,
    ruleset_id: &str,
    rule_id: &RuleId,
    status: RuleStatus,
    mirror: &Mirror,
    remote: &dyn RemoteClient,
) -> Result<Option<RuleStatus>, EngineError> {
    match status {
        RuleStatus::Rule => {
            let doc = mirror.read_rule(org.as_str(), ruleset_id, rule_id.as_str()).await.map_err(store_err)?;
            match remote.put_rule(ruleset_id, rule_id.as_str(), &doc).await {
                Ok(()) => Ok(None),
                Err(e) => {
                    tracing::warn!(org = %org, rule_id = %rule_id, error = %e, "push: rule update failed, will retry");
                    Ok(Some(status))
                }
            }
        }
        RuleStatus::Tags => {
            let tags = mirror.read_tags(org.as_str(), ruleset_id, rule_id.as_str()).await.map_err(store_err)?;
            match remote.post_tags(rule_id.as_str(), &tags).await {
                Ok(()) => Ok(None),
                Err(e) => {
                    tracing::warn!(org = %org, rule_id = %rule_id, error = %e, "push: tags update failed, will retry");
                    Ok(Some(status))
                }
            }
        }
        RuleStatus::Both => {
            let doc = mirror.read_rule(org.as_str(), ruleset_id, rule_id.as_str()).await.map_err(store_err)?;
            let tags = mirror.read_tags(org.as_str(), ruleset_id, rule_id.as_str()).await.map_err(store_err)?;
            let rule_ok = match remote.put_rule(ruleset_id, rule_id.as_str(), &doc).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(org = %org, rule_id = %rule_id, error = %e, "push: rule update failed, will retry");
                    false
                }
            };
            let tags_ok = match remote.post_tags(rule_id.as_str(), &tags).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(org = %org, rule_id = %rule_id, error = %e, "push: tags update failed, will retry");
                    false
                }
            };
            Ok(match (rule_ok, tags_ok) {
                (true, true) => None,
                (true, false) => Some(RuleStatus::Tags),
                (false, true) => Some(RuleStatus::Rule),
                (false, false) => Some(RuleStatus::Both),
            })
        }
        RuleStatus::Del => match remote.delete_rule(ruleset_id, rule_id.as_str()).await {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::warn!(org = %org, rule_id = %rule_id, error = %e, "push: rule delete failed, will retry");
                Ok(Some(RuleStatus::Del))
            }
        },
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
