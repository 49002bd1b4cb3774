// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dashboard entry: the view model the UI shell renders after login.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::{check_bearer_token, AuthError};
use crate::error::ClientResult;
use crate::gateway::{PinApi, StatusApi};
use crate::pin::{PinGate, PinGateDecision};
use crate::status_sync::{StatusSynchronizer, SyncReport};
use crate::storage::SessionStore;
use crate::verification::{NavigationTarget, Prompt, PromptTracker, UserVerificationState};

/// Everything the dashboard needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub state: UserVerificationState,
    pub enabled_targets: Vec<NavigationTarget>,
    /// Shown once per entry into a state
    pub prompt: Option<Prompt>,
    pub user_name: Option<String>,
    /// PIN gate result; evaluated for `ACTIVATED` users only
    pub pin: Option<PinGateDecision>,
    pub sync: SyncReport,
}

/// Outcome of entering the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEntry {
    /// No usable session; show the login screen
    LoginRequired(AuthError),
    Ready(DashboardView),
}

pub struct Dashboard<B> {
    store: Arc<SessionStore>,
    sync: Arc<StatusSynchronizer<B>>,
    pin_gate: Arc<PinGate<B>>,
    prompts: Mutex<PromptTracker>,
}

impl<B: StatusApi + PinApi> Dashboard<B> {
    pub fn new(
        store: Arc<SessionStore>,
        sync: Arc<StatusSynchronizer<B>>,
        pin_gate: Arc<PinGate<B>>,
    ) -> Self {
        Self {
            store,
            sync,
            pin_gate,
            prompts: Mutex::new(PromptTracker::new()),
        }
    }

    /// Refresh the verification state and compute the dashboard view.
    pub async fn enter(&self) -> ClientResult<DashboardEntry> {
        let token = self.store.token().await.unwrap_or_default();
        if let Err(e) = check_bearer_token(&token, Utc::now().timestamp()) {
            debug!(reason = e.error_code(), "Dashboard entry needs login");
            return Ok(DashboardEntry::LoginRequired(e));
        }

        let sync = self.sync.refresh().await?;
        let state = self.store.user_state().await;
        let gating = state.gating();
        let prompt = self.prompts.lock().await.observe(state);

        let pin = match (state, self.store.user_id().await) {
            (UserVerificationState::Activated, Some(user_id)) => {
                Some(self.pin_gate.check(user_id).await)
            }
            _ => None,
        };

        Ok(DashboardEntry::Ready(DashboardView {
            state,
            enabled_targets: gating.enabled_targets(),
            prompt,
            user_name: self.store.user_name().await,
            pin,
            sync,
        }))
    }

    /// Forget which prompts were shown (used on logout).
    pub async fn reset_prompts(&self) {
        self.prompts.lock().await.reset();
    }
}
