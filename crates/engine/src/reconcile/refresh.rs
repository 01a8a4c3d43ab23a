// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh: remote → local, one organization. Destructive of local
//! changes: it rebuilds the organization mirror from the remote platform
//! via crash-safe `.backup/`/`.remote/` staging.

use tsrm_core::{EngineError, OrgId, RuleId, RulesetDoc};
use tsrm_remote::RemoteClient;
use tsrm_storage::Mirror;
use tsrm_storage::StateStore;

use crate::error::{remote_err, store_err};

pub async fn refresh(org: &OrgId, mirror: &Mirror, store: &StateStore, remote: &dyn RemoteClient) -> Result<(), EngineError> {
    // Step 1: recover from a prior aborted refresh before staging a new one.
    if mirror.is_refreshing(org.as_str()).await {
        mirror.remove_remote_staging(org.as_str()).await.map_err(store_err)?;
    }
    if mirror.backup_dir_exists(org.as_str()).await {
        mirror.restore_from_backup(org.as_str()).await.map_err(store_err)?;
    }

    // Step 2: fresh staging.
    mirror.stage_for_refresh(org.as_str()).await.map_err(store_err)?;

    // Step 3, with step 4's rollback on any failure (including cancellation).
    if let Err(e) = fetch_remote_tree(org, mirror, remote).await {
        mirror.remove_remote_staging(org.as_str()).await.map_err(store_err)?;
        mirror.restore_from_backup(org.as_str()).await.map_err(store_err)?;
        return Err(e);
    }

    // Step 5: success — promote and clear the organization's pending entry.
    mirror.promote_remote_staging(org.as_str()).await.map_err(store_err)?;

    let org = org.clone();
    store
        .commit(move |state| {
            tsrm_storage::del_org(state, &org);
            Ok(())
        })
        .await
        .map_err(store_err)?;

    Ok(())
}

async fn fetch_remote_tree(org: &OrgId, mirror: &Mirror, remote: &dyn RemoteClient) -> Result<(), EngineError> {
    let rulesets = remote.get_rulesets().await.map_err(remote_err)?;
    for summary in rulesets {
        let doc = RulesetDoc {
            name: summary.name,
            description: summary.description,
            rule_ids: summary.rule_ids.into_iter().map(RuleId::from).collect(),
        };
        mirror
            .write_remote_ruleset(org.as_str(), &summary.id, &doc)
            .await
            .map_err(store_err)?;

        let rules = remote.get_ruleset_rules(&summary.id).await.map_err(remote_err)?;
        for rule in rules {
            let tags = remote.get_rule_tags(&rule.id).await.map_err(remote_err)?;
            mirror
                .write_remote_rule(org.as_str(), &summary.id, &rule.id, &rule.doc, &tags)
                .await
                .map_err(store_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
