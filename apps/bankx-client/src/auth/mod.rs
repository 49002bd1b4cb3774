// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session token handling for outbound requests.
//!
//! ## Auth Flow
//!
//! 1. Login or signup returns a bearer token, stored in the session store
//! 2. Every authenticated request asks the [`TokenProvider`] for the token
//! 3. The gateway checks it locally:
//!    - empty → [`AuthError::MissingToken`]
//!    - JWT with `exp` in the past → [`AuthError::TokenExpired`]
//! 4. Valid tokens are sent as `Authorization: Bearer <token>`
//!
//! A failed check never reaches the network.

pub mod error;
pub mod token;

use async_trait::async_trait;

pub use error::AuthError;
pub use token::{bearer_header_value, check_bearer_token, token_expiry};

/// Source of the current session token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The stored token, if any.
    async fn token(&self) -> Option<String>;
}
