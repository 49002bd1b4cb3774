// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Status Synchronizer
//!
//! Fetches the user's KYC status from the backend and reconciles it into
//! the session store. Used on demand (dashboard entry, after an upload) and
//! by the periodic [`StatusPoller`](crate::status_poller::StatusPoller).
//!
//! ## Fetch
//!
//! | Outcome | Handling |
//! |---------|----------|
//! | 2xx | status from `payload`; unknown/missing → `DEACTIVATED` |
//! | 403, other non-2xx, transport error | retry up to 3 times, 2 s apart |
//! | retries exhausted | fallback `UNVERIFIED` |
//! | no/expired token | no request, fallback `UNVERIFIED`, auth flagged unavailable |
//!
//! ## Reconciliation
//!
//! - Confirmed results overwrite the stored state when it differs.
//! - Fallback results only ever tighten the stored state. `DEACTIVATED`
//!   and `EMPTY` rank above `UNVERIFIED`, so a fallback leaves them as is.
//! - Every check takes a ticket when it starts. A confirmed result older
//!   than the last applied one may tighten the state but never relax it.
//!
//! The decision runs under the store lock, so the on-demand and periodic
//! paths can run at the same time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::gateway::StatusApi;
use crate::storage::{SessionStore, StateUpdate, StorageResult};
use crate::verification::UserVerificationState;

/// Bounded fixed-delay retry for the status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Result of one status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusResult {
    /// The backend answered with a 2xx
    Confirmed(UserVerificationState),
    /// No authoritative answer; the state is the conservative default
    Fallback {
        state: UserVerificationState,
        /// Requests actually sent
        attempts: u32,
        /// The request was never sent because no valid token was available
        auth_unavailable: bool,
    },
}

impl StatusResult {
    fn fallback(attempts: u32, auth_unavailable: bool) -> Self {
        StatusResult::Fallback {
            state: UserVerificationState::Unverified,
            attempts,
            auth_unavailable,
        }
    }

    pub fn state(&self) -> UserVerificationState {
        match self {
            StatusResult::Confirmed(state) => *state,
            StatusResult::Fallback { state, .. } => *state,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, StatusResult::Confirmed(_))
    }

    pub fn auth_unavailable(&self) -> bool {
        matches!(
            self,
            StatusResult::Fallback {
                auth_unavailable: true,
                ..
            }
        )
    }
}

/// Outcome of a fetch-and-reconcile round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub result: StatusResult,
    pub update: StateUpdate,
}

/// Fetches and reconciles the verification state.
pub struct StatusSynchronizer<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    policy: RetryPolicy,
    next_ticket: AtomicU64,
    /// Ticket of the newest confirmed result reconciled so far. Held across
    /// the store write so it only advances once that write succeeded.
    last_applied: Mutex<u64>,
    periodic_active: AtomicBool,
}

impl<B: StatusApi> StatusSynchronizer<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            store,
            policy,
            next_ticket: AtomicU64::new(0),
            last_applied: Mutex::new(0),
            periodic_active: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Fetch the remote status with bounded retry. Never fails.
    pub async fn fetch_status(&self) -> StatusResult {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.backend.fetch_upload_status().await {
                Ok(raw) => {
                    let state = UserVerificationState::from_remote_status(raw.as_deref());
                    debug!(attempts, state = %state, "Status fetch succeeded");
                    return StatusResult::Confirmed(state);
                }
                Err(ClientError::AuthUnavailable(e)) => {
                    warn!(reason = e.error_code(), "Status fetch skipped: authentication unavailable");
                    return StatusResult::fallback(attempts - 1, true);
                }
                Err(e) => {
                    if attempts > self.policy.max_retries {
                        warn!(attempts, error = %e, "Status fetch failed, falling back to UNVERIFIED");
                        return StatusResult::fallback(attempts, false);
                    }
                    debug!(
                        attempt = attempts,
                        status = ?e.http_status(),
                        retry_in_ms = self.policy.delay.as_millis() as u64,
                        "Status fetch failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    pub(crate) fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reconcile a result obtained by the check holding `ticket`.
    pub(crate) async fn reconcile(
        &self,
        ticket: u64,
        result: StatusResult,
    ) -> StorageResult<StateUpdate> {
        let mut last_applied = self.last_applied.lock().await;
        let proposed = result.state();
        let confirmed = result.is_confirmed();
        let stale = confirmed && ticket < *last_applied;

        let update = self
            .store
            .update_state(|current| {
                let tightens = proposed.is_more_restrictive_than(current);
                if stale && !tightens {
                    debug!(ticket, state = %proposed, "Discarding stale status result");
                }
                let accept = if confirmed { !stale || tightens } else { tightens };
                accept.then_some(proposed)
            })
            .await?;

        if confirmed && !stale {
            *last_applied = ticket;
        }

        if update.written {
            info!(
                previous = %update.previous,
                current = %update.current,
                confirmed,
                "Verification state updated"
            );
        }
        Ok(update)
    }

    /// Fetch the status and reconcile it into the store.
    pub async fn refresh(&self) -> StorageResult<SyncReport> {
        let ticket = self.take_ticket();
        let result = self.fetch_status().await;
        let update = self.reconcile(ticket, result).await?;
        Ok(SyncReport { result, update })
    }

    /// Claim the single periodic slot. `None` if a periodic run is active.
    pub(crate) fn claim_periodic(&self) -> Option<PeriodicClaim<'_>> {
        self.periodic_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PeriodicClaim {
                flag: &self.periodic_active,
            })
    }
}

/// Held by the running periodic job; releases the slot on drop.
pub(crate) struct PeriodicClaim<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PeriodicClaim<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
