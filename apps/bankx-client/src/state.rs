// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Explicitly wired client state.
//!
//! Every service shares one [`SessionStore`], one backend and one history
//! cache. Nothing is global; the UI shell or the sync daemon builds an
//! [`AppState`] once and clones the `Arc`s it needs.

use std::sync::Arc;

use tracing::info;

use crate::accounts::AccountService;
use crate::config::ClientConfig;
use crate::dashboard::Dashboard;
use crate::documents::DocumentService;
use crate::error::ClientResult;
use crate::gateway::{BankingBackend, HttpBankingClient};
use crate::pin::PinGate;
use crate::session::SessionService;
use crate::status_poller::StatusPoller;
use crate::status_sync::{RetryPolicy, StatusSynchronizer};
use crate::storage::{HistoryCache, SessionStore, StoragePaths};
use crate::transactions::{HistoryService, TransferService};

pub struct AppState<B> {
    pub config: ClientConfig,
    pub store: Arc<SessionStore>,
    pub backend: Arc<B>,
    pub history_cache: Arc<HistoryCache>,
    pub sync: Arc<StatusSynchronizer<B>>,
    pub pin_gate: Arc<PinGate<B>>,
    pub session: SessionService<B>,
    pub accounts: AccountService<B>,
    pub documents: DocumentService<B>,
    pub transfers: TransferService<B>,
    pub history: HistoryService<B>,
    pub dashboard: Dashboard<B>,
}

impl AppState<HttpBankingClient> {
    /// Open the session store under `config.data_dir` and connect to the
    /// configured backend.
    pub fn open(config: ClientConfig) -> ClientResult<Self> {
        let store = Arc::new(SessionStore::open(StoragePaths::new(&config.data_dir))?);
        let backend = HttpBankingClient::new(
            &config.api_base_url,
            config.http_timeout,
            store.clone(),
        )?;

        info!(
            api = %config.api_base_url,
            data_dir = %config.data_dir.display(),
            "Client state opened"
        );
        Ok(Self::new(Arc::new(backend), store, config))
    }
}

impl<B: BankingBackend> AppState<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, config: ClientConfig) -> Self {
        let history_cache = Arc::new(HistoryCache::default());
        let sync = Arc::new(StatusSynchronizer::new(
            backend.clone(),
            store.clone(),
            RetryPolicy::default(),
        ));
        let pin_gate = Arc::new(PinGate::new(
            backend.clone(),
            store.clone(),
            config.pin_suppression,
        ));

        Self {
            session: SessionService::new(backend.clone(), store.clone(), history_cache.clone()),
            accounts: AccountService::new(backend.clone()),
            documents: DocumentService::new(backend.clone(), store.clone(), sync.clone()),
            transfers: TransferService::new(
                backend.clone(),
                store.clone(),
                pin_gate.clone(),
                history_cache.clone(),
            ),
            history: HistoryService::new(backend.clone(), store.clone(), history_cache.clone()),
            dashboard: Dashboard::new(store.clone(), sync.clone(), pin_gate.clone()),
            config,
            store,
            backend,
            history_cache,
            sync,
            pin_gate,
        }
    }

    /// Periodic status poller using the configured interval.
    pub fn status_poller(&self) -> StatusPoller<B> {
        StatusPoller::new(self.sync.clone()).with_interval(self.config.status_poll_interval)
    }

    /// Clear the session and forget which prompts were shown.
    pub async fn logout(&self) -> ClientResult<()> {
        self.session.logout().await?;
        self.dashboard.reset_prompts().await;
        Ok(())
    }
}
