// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `bankx-sync`: keeps the stored verification state in line with the
//! backend while the app is closed.
//!
//! The poller is registered on every launch; a store that already has one
//! running keeps it.

use bankx_client::config::LOG_FORMAT_ENV;
use bankx_client::status_poller::PollerExit;
use bankx_client::{AppState, ClientConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ClientConfig::from_env()?;
    let state = AppState::open(config)?;

    let shutdown = CancellationToken::new();
    let poller = tokio::spawn(state.status_poller().run(shutdown.clone()));

    info!("Status sync running, press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    shutdown.cancel();

    match poller.await? {
        PollerExit::Cancelled => info!("Status sync stopped"),
        PollerExit::AlreadyRunning => info!("Status sync was already running"),
    }
    Ok(())
}
