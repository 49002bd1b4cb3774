// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction PIN
//!
//! A transfer may only be submitted once the backend confirms a PIN exists
//! for the user. The gate has three outcomes:
//!
//! | Backend answer | Decision |
//! |----------------|----------|
//! | `true` | [`PinGateDecision::Proceed`] |
//! | `false` | [`PinGateDecision::CreatePin`]: route to PIN creation |
//! | error | [`PinGateDecision::CheckFailed`]: surface it, do not proceed |
//!
//! Right after a PIN is created the remote check is skipped for a short
//! window, so the user is not bounced back to creation while the backend
//! catches up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::PinApi;
use crate::models::PinRequest;
use crate::storage::SessionStore;

/// Number of digits in a transaction PIN.
pub const PIN_LENGTH: usize = 6;

/// Default window during which a fresh PIN skips the remote check.
pub const DEFAULT_PIN_SUPPRESSION: Duration = Duration::from_secs(5);

const SEQUENTIAL_PINS: [&str; 9] = [
    "123456", "234567", "345678", "456789", "543210", "654321", "765432", "876543", "987654",
];

/// A six-digit transaction PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Parse a PIN: exactly six ASCII digits.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        if raw.len() != PIN_LENGTH || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::validation("PIN must be exactly 6 digits"));
        }
        Ok(Self(raw.to_string()))
    }

    /// Parse a new PIN and its confirmation, rejecting easy sequences.
    pub fn new_with_confirmation(pin: &str, confirmation: &str) -> ClientResult<Self> {
        let parsed = Self::parse(pin)?;
        if pin != confirmation {
            return Err(ClientError::validation("PINs do not match"));
        }
        if parsed.is_sequential() {
            return Err(ClientError::validation(
                "PIN cannot be a sequence of consecutive digits",
            ));
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_sequential(&self) -> bool {
        SEQUENTIAL_PINS.contains(&self.0.as_str())
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin(<redacted>)")
    }
}

/// Outcome of the PIN existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinGateDecision {
    Proceed,
    CreatePin,
    CheckFailed(String),
}

/// PIN existence gate in front of fund transfers.
pub struct PinGate<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    suppression: Duration,
    /// User id and time of the last PIN created on this device
    last_created: Mutex<Option<(i64, Instant)>>,
}

impl<B: PinApi> PinGate<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, suppression: Duration) -> Self {
        Self {
            backend,
            store,
            suppression,
            last_created: Mutex::new(None),
        }
    }

    fn recently_created(&self, user_id: i64) -> bool {
        self.last_created
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .is_some_and(|(id, at)| id == user_id && at.elapsed() < self.suppression)
    }

    async fn pin_exists(&self, user_id: i64) -> ClientResult<bool> {
        if self.recently_created(user_id) && self.store.pin_created_at(user_id).await.is_some() {
            return Ok(true);
        }
        self.backend.check_pin(user_id).await
    }

    /// Ask whether `user_id` may proceed to a transfer.
    pub async fn check(&self, user_id: i64) -> PinGateDecision {
        match self.pin_exists(user_id).await {
            Ok(true) => PinGateDecision::Proceed,
            Ok(false) => PinGateDecision::CreatePin,
            Err(e) => {
                warn!(user_id, error = %e, "PIN check failed");
                PinGateDecision::CheckFailed(e.to_string())
            }
        }
    }

    /// [`PinGate::check`] for the logged-in user.
    pub async fn check_current(&self) -> ClientResult<PinGateDecision> {
        let user_id = current_user_id(&self.store).await?;
        Ok(self.check(user_id).await)
    }

    /// Fail unless the user may proceed.
    ///
    /// Auth precondition failures pass through unchanged so the caller can
    /// route to login.
    pub async fn require_proceed(&self, user_id: i64) -> ClientResult<()> {
        match self.pin_exists(user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ClientError::PinRequired),
            Err(e @ ClientError::AuthUnavailable(_)) => Err(e),
            Err(e) => Err(ClientError::PinCheckFailed(e.to_string())),
        }
    }

    /// Create a PIN for the logged-in user.
    ///
    /// The backend is written first; the local marker only after it accepts.
    pub async fn create_pin(&self, pin: &str, confirmation: &str) -> ClientResult<Pin> {
        let pin = Pin::new_with_confirmation(pin, confirmation)?;
        let user_id = current_user_id(&self.store).await?;

        self.backend
            .save_pin(&PinRequest {
                user_id,
                pin: pin.as_str().to_string(),
            })
            .await?;
        self.store.mark_pin_created(user_id).await?;

        if let Ok(mut last) = self.last_created.lock() {
            *last = Some((user_id, Instant::now()));
        }

        info!(user_id, "Transaction PIN created");
        Ok(pin)
    }
}

/// Logged-in user id, or an auth error when there is none.
pub(crate) async fn current_user_id(store: &SessionStore) -> ClientResult<i64> {
    store
        .user_id()
        .await
        .ok_or(ClientError::AuthUnavailable(crate::auth::AuthError::MissingToken))
}
