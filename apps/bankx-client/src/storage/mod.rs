// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Durable client state lives in a single JSON preferences file under the
//! data directory; short-lived caches stay in memory.
//!
//! ## Storage Layout
//!
//! ```text
//! {BANKX_DATA_DIR}/
//!   preferences.json   # token, user id/name, PIN markers, verification state
//!   .lock              # held by whichever process is rewriting preferences.json
//! ```
//!
//! Every write reloads the preferences document under the lock and replaces
//! it through a synced staging file and a rename.

pub mod file_store;
pub mod history_cache;
pub mod paths;
pub mod session_store;

pub use file_store::{JsonFileStore, StorageError, StorageResult};
pub use history_cache::{HistoryCache, DEFAULT_HISTORY_TTL};
pub use paths::StoragePaths;
pub use session_store::{SessionStore, StateUpdate};
