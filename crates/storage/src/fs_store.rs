// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic read/write of small JSON documents at known paths.
//!
//! Writes stage to a temp file in the target's directory and rename it into
//! place, so a crash mid-write never leaves a partially-written document.
//! Built on `tokio::fs` + `tempfile` since the reconciler and fan-out that
//! call this are async.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Read and deserialize a JSON document. A missing file is reported as
/// [`StoreError::NotFound`], distinct from other IO failures, so callers
/// can distinguish "nothing pending" from a real disk error.
pub async fn read<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Serialize and atomically write a JSON document. The parent directory
/// must already exist — this function does not create intermediate
/// directories implicitly.
pub async fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Invariant(format!("path has no parent: {}", path.display())))?
        .to_path_buf();
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|join_err| StoreError::Invariant(join_err.to_string()))??;

    Ok(())
}

/// True if a file exists at `path`.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}
