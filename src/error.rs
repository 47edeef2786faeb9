//! Unified application error model.
//! This module provides the common error enum used across the interaction
//! core, along with helper constructors and accessors. Every variant is
//! recoverable: errors are rendered at the triggering action and never
//! propagated into the interaction gate's pending queue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MallError {
    /// Bad user input (moderation hit, missing form field). Shown inline.
    #[error("{code}: {message}")]
    Validation { code: String, message: String },
    /// The identity store rejected credentials or account creation.
    #[error("{code}: {message}")]
    Auth { code: String, message: String },
    /// Profile store read/write failure; retry is left to the user.
    #[error("{code}: {message}")]
    Store { code: String, message: String },
    /// Geolocation access refused; user must retry the pin action.
    #[error("{code}: {message}")]
    PermissionDenied { code: String, message: String },
}

impl MallError {
    pub fn code_str(&self) -> &str {
        match self {
            MallError::Validation { code, .. }
            | MallError::Auth { code, .. }
            | MallError::Store { code, .. }
            | MallError::PermissionDenied { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            MallError::Validation { message, .. }
            | MallError::Auth { message, .. }
            | MallError::Store { message, .. }
            | MallError::PermissionDenied { message, .. } => message.as_str(),
        }
    }

    pub fn validation(code: impl Into<String>, msg: impl Into<String>) -> Self {
        MallError::Validation { code: code.into(), message: msg.into() }
    }
    pub fn auth(code: impl Into<String>, msg: impl Into<String>) -> Self {
        MallError::Auth { code: code.into(), message: msg.into() }
    }
    pub fn store(code: impl Into<String>, msg: impl Into<String>) -> Self {
        MallError::Store { code: code.into(), message: msg.into() }
    }
    pub fn permission_denied(code: impl Into<String>, msg: impl Into<String>) -> Self {
        MallError::PermissionDenied { code: code.into(), message: msg.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MallError::Validation { .. })
    }
    pub fn is_auth(&self) -> bool {
        matches!(self, MallError::Auth { .. })
    }
    pub fn is_store(&self) -> bool {
        matches!(self, MallError::Store { .. })
    }
}

pub type MallResult<T> = Result<T, MallError>;
