// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level error taxonomy. Every fallible public operation in the
//! workspace ultimately resolves into one of these five kinds.
//! Crate-level errors (`tsrm-storage::StoreError`, `tsrm-remote::RemoteError`)
//! live in crates that depend on this one, so they can't convert into
//! `EngineError` via `#[from]` without violating the orphan rule;
//! `tsrm-engine::error` maps them explicitly instead. `LatticeError` is
//! local to this crate, so it gets the ordinary `#[from]`-equivalent
//! `From` impl below.

use thiserror::Error;

use crate::status::LatticeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("refresh already in progress for organization {0}")]
    RefreshInProgress(String),

    #[error("remote platform request failed: {0}")]
    RemoteFailure(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<LatticeError> for EngineError {
    fn from(err: LatticeError) -> Self {
        EngineError::InvariantViolation(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
