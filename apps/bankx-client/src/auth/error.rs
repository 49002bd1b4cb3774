// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local authentication errors.

/// Reasons a session token cannot be attached to an outbound request.
///
/// Every variant is detected on the device, before any network I/O. The UI
/// shell routes all of them to the login screen, which is what separates
/// them from a request the backend rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token stored for the current session
    MissingToken,
    /// Three-part token whose claims segment could not be decoded
    MalformedToken,
    /// Token `exp` claim is in the past or missing
    TokenExpired,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::TokenExpired => "token_expired",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "No session token available"),
            AuthError::MalformedToken => write!(f, "Session token is malformed"),
            AuthError::TokenExpired => write!(f, "Session token has expired"),
        }
    }
}

impl std::error::Error for AuthError {}
