// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-level error type.

use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Everything a client operation can fail with.
///
/// The UI shell branches on the variant: [`ClientError::AuthUnavailable`]
/// routes to login, [`ClientError::Validation`] stays on the form,
/// [`ClientError::PinRequired`] routes to PIN creation, the rest are shown
/// as a message.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local auth precondition failed; no request was sent
    #[error("authentication unavailable: {0}")]
    AuthUnavailable(#[from] AuthError),

    /// Backend answered with a non-2xx status
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Network-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Transport(String),

    /// 2xx response whose body could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Backend processed the request and declined it
    #[error("{0}")]
    Rejected(String),

    /// No PIN exists for the user; create one before transferring
    #[error("no transaction PIN set for this user")]
    PinRequired,

    /// The PIN existence check itself failed
    #[error("could not verify transaction PIN: {0}")]
    PinCheckFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        ClientError::InvalidResponse(message.into())
    }

    /// HTTP status of a backend rejection, if this is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the UI should send the user back to login.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::AuthUnavailable(_) | ClientError::Http { status: 401, .. }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
