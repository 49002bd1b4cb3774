// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! BankX client core
//!
//! Session handling, KYC verification state and the banking operations the
//! BankX mobile app performs against its backend. A UI shell drives the
//! services in [`state::AppState`]; the `bankx-sync` binary runs the periodic
//! status sync on its own.
//!
//! ## Modules
//!
//! - `auth` - Bearer token checks before any authenticated call
//! - `gateway` - Backend endpoints (reqwest)
//! - `storage` - Session store on disk and the history cache
//! - `verification` - Verification states, gating and prompts
//! - `status_sync` / `status_poller` - Remote status reconciliation
//! - `session`, `documents`, `accounts`, `pin`, `transactions`, `dashboard` - User flows

pub mod accounts;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod models;
pub mod pin;
pub mod session;
pub mod state;
pub mod status_poller;
pub mod status_sync;
pub mod storage;
pub mod transactions;
pub mod validation;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use state::AppState;
pub use verification::UserVerificationState;
