// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-client error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    RequestFailed(String),
    #[error("remote response contained errors: {0}")]
    ResponseErrors(String),
    #[error("not found: {0}")]
    NotFound(String),
}
