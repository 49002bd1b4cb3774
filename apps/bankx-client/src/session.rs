// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, signup and logout.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::{check_bearer_token, AuthError};
use crate::error::{ClientError, ClientResult};
use crate::gateway::AuthApi;
use crate::models::{ApiEnvelope, AuthPayload, AuthenticatedSession, LoginRequest};
use crate::storage::{HistoryCache, SessionStore};
use crate::validation::SignUpForm;
use crate::verification::Transition;

pub struct SessionService<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    history_cache: Arc<HistoryCache>,
}

impl<B: AuthApi> SessionService<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, history_cache: Arc<HistoryCache>) -> Self {
        Self {
            backend,
            store,
            history_cache,
        }
    }

    /// Log in and persist the session.
    ///
    /// A different user logging in on this device starts from a clean store.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthenticatedSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Email and password are required"));
        }

        let envelope = self
            .backend
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        let session = session_from(envelope, "Login failed")?;

        if let Some(previous) = self.store.user_id().await {
            if previous != session.user_id {
                self.clear_local_state().await?;
            }
        }
        self.store
            .save_session(&session.token, session.user_id, &session.user_name)
            .await?;

        info!(user_id = session.user_id, "User logged in");
        Ok(session)
    }

    /// Validate the form, register, and record the new account as
    /// `DEACTIVATED` (documents outstanding).
    pub async fn sign_up(&self, form: &SignUpForm) -> ClientResult<AuthenticatedSession> {
        let request = form.validate()?;
        let envelope = self.backend.sign_up(&request).await?;
        let session = session_from(envelope, "Sign-up successful but no payload received.")?;

        self.clear_local_state().await?;
        self.store
            .save_session(&session.token, session.user_id, &session.user_name)
            .await?;
        self.store
            .apply_transition(Transition::AccountCreated)
            .await?;

        info!(user_id = session.user_id, "Account created");
        Ok(session)
    }

    /// Forget the session. The verification state reads `EMPTY` afterwards.
    pub async fn logout(&self) -> ClientResult<()> {
        self.clear_local_state().await?;
        info!("User logged out");
        Ok(())
    }

    /// Whether a usable token is stored right now.
    pub async fn session_check(&self) -> Result<(), AuthError> {
        let token = self.store.token().await.unwrap_or_default();
        check_bearer_token(&token, Utc::now().timestamp())
    }

    async fn clear_local_state(&self) -> ClientResult<()> {
        self.store.clear_all().await?;
        self.history_cache.clear();
        Ok(())
    }
}

fn session_from(
    envelope: ApiEnvelope<AuthPayload>,
    missing_payload: &str,
) -> ClientResult<AuthenticatedSession> {
    let message = envelope.message_or(missing_payload);
    let payload = envelope
        .payload
        .ok_or_else(|| ClientError::Rejected(message))?;

    let token = payload
        .token
        .clone()
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ClientError::invalid_response("response did not include a session token"))?;

    Ok(AuthenticatedSession {
        token,
        user_id: payload.user_id(),
        user_name: payload.display_name(),
    })
}
