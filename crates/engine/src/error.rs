// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary error conversions into [`tsrm_core::EngineError`].
//!
//! `EngineError` lives in `tsrm-core` so it stays free of a dependency on
//! either `tsrm-storage` or `tsrm-remote` (those crates depend on
//! `tsrm-core`, not the reverse, so a `#[from]` there would be circular).
//! These are plain mapping functions instead, applied with `.map_err(...)`
//! at every storage/remote call site in this crate.

use tsrm_core::EngineError;
use tsrm_remote::RemoteError;
use tsrm_storage::StoreError;

/// A storage-layer failure during an engine operation. I/O and JSON errors
/// don't have a dedicated `EngineError` kind — they're surfaced as
/// `InvariantViolation` since a filesystem that can't be read or written
/// mid-operation has broken an assumption this layer depends on, not a
/// remote or user-input problem.
pub(crate) fn store_err(err: StoreError) -> EngineError {
    match err {
        StoreError::NotFound(what) => EngineError::NotFound(what),
        other => EngineError::InvariantViolation(other.to_string()),
    }
}

pub(crate) fn remote_err(err: RemoteError) -> EngineError {
    match err {
        RemoteError::NotFound(what) => EngineError::NotFound(what),
        other => EngineError::RemoteFailure(other.to_string()),
    }
}
