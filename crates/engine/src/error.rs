// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use fm_adapters::{GitError, ModelError, MuxError};
use fm_core::ErrorKind;
use fm_policy::PolicyError;
use thiserror::Error;

/// Errors that can occur in the engine.
///
/// Every variant maps onto one taxonomy kind; the daemon translates
/// kinds to protocol status codes through a single table.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("command rejected: {0}")]
    PolicyDenied(#[from] PolicyError),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("multiplexer error: {0}")]
    Mux(#[from] MuxError),
    #[error("git error: {0}")]
    Git(#[from] GitError),
    #[error("provider error: {0}")]
    Provider(#[from] ModelError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Taxonomy kind for the control-plane mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::PolicyDenied(_) => ErrorKind::PermissionDenied,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Unavailable(_) => ErrorKind::Unavailable,
            EngineError::Mux(MuxError::NotFound(_)) => ErrorKind::NotFound,
            EngineError::Mux(_) => ErrorKind::Internal,
            EngineError::Git(_) => ErrorKind::Internal,
            EngineError::Provider(ModelError::Unconfigured(_)) => ErrorKind::Unavailable,
            EngineError::Provider(_) => ErrorKind::BadGateway,
            EngineError::Storage(_) => ErrorKind::Internal,
            EngineError::Cancelled => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
