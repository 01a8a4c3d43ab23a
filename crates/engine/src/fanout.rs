// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organization fan-out: dispatch push/refresh across a list of
//! organizations through a bounded worker pool, while guaranteeing that
//! push and refresh never run concurrently on the same organization —
//! enforced with a per-organization `tokio::sync::Mutex` acquired before
//! every reconcile call, whether dispatched by this module or by an
//! engine instance's own eager push.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinSet;
use tsrm_core::{EngineError, OrgId};
use tsrm_remote::RemoteClient;
use tsrm_storage::{Mirror, StateStore};

use crate::reconcile;

/// Registry of per-organization locks, shared by every `Engine` instance
/// and by `fanout` itself, so a direct call and a fan-out dispatch can
/// never race on the same organization.
#[derive(Clone, Default)]
pub struct OrgLocks {
    inner: Arc<SyncMutex<HashMap<OrgId, Arc<AsyncMutex<()>>>>>,
}

impl OrgLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, org: &OrgId) -> Arc<AsyncMutex<()>> {
        self.inner.lock().entry(org.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    pub async fn acquire(&self, org: &OrgId) -> OwnedMutexGuard<()> {
        self.entry(org).lock_owned().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileKind {
    Push,
    Refresh,
}

/// Reconcile every organization in `orgs`. Sequential unless
/// `worker_count >= 2` and `orgs.len() >= 2`. Returns one result per
/// organization; order is not meaningful under fan-out.
pub async fn reconcile_many(
    kind: ReconcileKind,
    orgs: &[OrgId],
    mirror: Arc<Mirror>,
    store: Arc<StateStore>,
    remote: Arc<dyn RemoteClient>,
    suffix: &str,
    worker_count: usize,
    locks: &OrgLocks,
) -> Vec<(OrgId, Result<(), EngineError>)> {
    if worker_count < 2 || orgs.len() < 2 {
        let mut out = Vec::with_capacity(orgs.len());
        for org in orgs {
            let _guard = locks.acquire(org).await;
            let result = run_one(kind, org, &mirror, &store, remote.as_ref(), suffix).await;
            out.push((org.clone(), result));
        }
        return out;
    }

    let semaphore = Arc::new(Semaphore::new(worker_count));
    let mut set = JoinSet::new();
    let mut org_by_task: HashMap<tokio::task::Id, OrgId> = HashMap::with_capacity(orgs.len());
    for org in orgs.iter().cloned() {
        let semaphore = semaphore.clone();
        let mirror = mirror.clone();
        let store = store.clone();
        let remote = remote.clone();
        let locks = locks.clone();
        let suffix = suffix.to_string();
        let org_for_task = org.clone();
        let handle = set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let _guard = locks.acquire(&org).await;
            let result = run_one(kind, &org, &mirror, &store, remote.as_ref(), &suffix).await;
            (org, result)
        });
        org_by_task.insert(handle.id(), org_for_task);
    }

    let mut out = Vec::with_capacity(orgs.len());
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((_, pair)) => out.push(pair),
            Err(join_err) => {
                let org = org_by_task.remove(&join_err.id()).unwrap_or_else(|| OrgId::from("<unknown-worker>"));
                out.push((org, Err(EngineError::InvariantViolation(join_err.to_string()))));
            }
        }
    }
    out
}

async fn run_one(
    kind: ReconcileKind,
    org: &OrgId,
    mirror: &Mirror,
    store: &StateStore,
    remote: &dyn RemoteClient,
    suffix: &str,
) -> Result<(), EngineError> {
    match kind {
        ReconcileKind::Push => reconcile::push::push(org, mirror, store, remote, suffix).await,
        ReconcileKind::Refresh => reconcile::refresh::refresh(org, mirror, store, remote).await,
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
