// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Status Poller
//!
//! Background task that periodically refreshes the verification state, so
//! an approval or suspension reaches the store even while no screen is
//! asking for it.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 60 s) the poller runs one sweep:
//! 1. Skip when no session token is stored (nobody is logged in).
//! 2. Otherwise run [`StatusSynchronizer::refresh`].
//! 3. Report the sweep as [`SweepOutcome::Success`] or [`SweepOutcome::Retry`].
//!
//! Only one poller runs per synchronizer; a second `run` returns at once
//! with [`PollerExit::AlreadyRunning`].
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::gateway::StatusApi;
use crate::status_sync::StatusSynchronizer;

/// Default interval between polling sweeps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one sweep, as reported to the scheduler log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Authoritative status reconciled, or nothing to do
    Success,
    /// Fallback result or storage failure; the next sweep tries again
    Retry,
}

/// Why [`StatusPoller::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    Cancelled,
    /// Another poller already owns this synchronizer
    AlreadyRunning,
}

/// Periodic driver for a [`StatusSynchronizer`].
pub struct StatusPoller<B> {
    sync: Arc<StatusSynchronizer<B>>,
    poll_interval: Duration,
}

impl<B: StatusApi> StatusPoller<B> {
    pub fn new(sync: Arc<StatusSynchronizer<B>>) -> Self {
        Self {
            sync,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) -> PollerExit {
        let Some(_claim) = self.sync.claim_periodic() else {
            info!("Status poller already running, keeping the existing one");
            return PollerExit::AlreadyRunning;
        };

        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Status poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Status poller shutting down");
                return PollerExit::Cancelled;
            }

            let outcome = tokio::select! {
                outcome = self.poll_step() => outcome,
                _ = shutdown.cancelled() => {
                    info!("Status poller shutting down");
                    return PollerExit::Cancelled;
                }
            };
            debug!(outcome = ?outcome, "Status poller sweep finished");

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Status poller shutting down");
                    return PollerExit::Cancelled;
                }
            }
        }
    }

    /// Execute one sweep.
    pub async fn poll_step(&self) -> SweepOutcome {
        if self.sync.store().token().await.is_none() {
            debug!("Status poller: no session, skipping sweep");
            return SweepOutcome::Success;
        }

        match self.sync.refresh().await {
            Ok(report) if report.result.is_confirmed() => {
                info!(
                    state = %report.update.current,
                    changed = report.update.written,
                    "Status poller: status reconciled"
                );
                SweepOutcome::Success
            }
            Ok(report) => {
                warn!(
                    state = %report.update.current,
                    auth_unavailable = report.result.auth_unavailable(),
                    "Status poller: no authoritative status, will retry"
                );
                SweepOutcome::Retry
            }
            Err(e) => {
                warn!(error = %e, "Status poller: failed to persist status");
                SweepOutcome::Retry
            }
        }
    }
}
