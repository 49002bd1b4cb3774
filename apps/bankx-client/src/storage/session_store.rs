// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent session store.
//!
//! Holds everything the client remembers between launches in a single JSON
//! preferences file. The app and the `bankx-sync` daemon share that file, so
//! the file is the source of truth: every read loads it again, and every
//! read-modify-write reloads it while holding the data directory lock, then
//! writes the result before the in-memory copy is replaced. The in-memory
//! copy only answers reads when the file cannot be loaded.
//!
//! PINs are never written. The store only records that a PIN was created
//! for a user id, and when.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{JsonFileStore, StorageError, StoragePaths, StorageResult};
use crate::auth::TokenProvider;
use crate::verification::{Transition, UserVerificationState};

/// On-disk layout of the preferences file.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Preferences {
    user_token: Option<String>,
    documents_uploaded: bool,
    user_state: Option<String>,
    user_id: Option<i64>,
    user_name: Option<String>,
    /// When each user id last created a PIN
    pins_created: BTreeMap<i64, DateTime<Utc>>,
}

impl Preferences {
    fn state(&self) -> UserVerificationState {
        match self.user_state.as_deref() {
            None => UserVerificationState::Empty,
            Some(raw) => UserVerificationState::parse(raw).unwrap_or_else(|| {
                warn!(stored = raw, "Unknown verification state in store, reading as EMPTY");
                UserVerificationState::Empty
            }),
        }
    }
}

/// Outcome of a verification state write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    pub previous: UserVerificationState,
    pub current: UserVerificationState,
    /// Whether the store was actually written
    pub written: bool,
}

impl StateUpdate {
    fn unchanged(state: UserVerificationState) -> Self {
        Self {
            previous: state,
            current: state,
            written: false,
        }
    }
}

/// Durable key-value store for the logged-in session.
pub struct SessionStore {
    storage: JsonFileStore,
    /// Last version loaded from or written to disk
    prefs: Mutex<Preferences>,
    revision: AtomicU64,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("root", &self.storage.paths().root())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Open (or create) the store under `paths`.
    ///
    /// A preferences file that cannot be parsed is discarded with a warning
    /// and the session starts empty.
    pub fn open(paths: StoragePaths) -> StorageResult<Self> {
        let storage = JsonFileStore::open(paths)?;
        let prefs = load_or_reset(&storage)?;

        debug!(path = %storage.paths().preferences().display(), "Session store opened");

        Ok(Self {
            storage,
            prefs: Mutex::new(prefs),
            revision: AtomicU64::new(0),
        })
    }

    /// Number of writes this handle made since it was opened.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Current preferences as stored on disk.
    ///
    /// Falls back to the last known copy when the file cannot be read, so a
    /// concurrent writer never makes a read fail.
    async fn snapshot(&self) -> Preferences {
        let mut cached = self.prefs.lock().await;
        match self.storage.load::<Preferences>(&self.storage.paths().preferences()) {
            Ok(loaded) => *cached = loaded.unwrap_or_default(),
            Err(e) => warn!(error = %e, "Cannot reload preferences, using last known copy"),
        }
        cached.clone()
    }

    /// Reload the preferences under the directory lock, apply `change` and
    /// write the result if it differs from what was loaded.
    async fn transact<F, R>(&self, change: F) -> StorageResult<R>
    where
        F: FnOnce(&mut Preferences) -> R,
    {
        let mut cached = self.prefs.lock().await;
        let _lock = self.storage.lock()?;

        let mut prefs = load_or_reset(&self.storage)?;
        let loaded = prefs.clone();
        let outcome = change(&mut prefs);

        if prefs != loaded {
            self.storage
                .save(&self.storage.paths().preferences(), &prefs)?;
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
        *cached = prefs;
        Ok(outcome)
    }

    // ========== Token ==========

    /// The stored session token, if any.
    pub async fn token(&self) -> Option<String> {
        self.snapshot()
            .await
            .user_token
            .filter(|token| !token.trim().is_empty())
    }

    pub async fn save_token(&self, token: &str) -> StorageResult<()> {
        let token = token.to_string();
        self.transact(move |prefs| prefs.user_token = Some(token))
            .await
    }

    pub async fn clear_token(&self) -> StorageResult<()> {
        self.transact(|prefs| prefs.user_token = None).await
    }

    /// Record a freshly authenticated session in one write.
    pub async fn save_session(&self, token: &str, user_id: i64, user_name: &str) -> StorageResult<()> {
        let token = token.to_string();
        let user_name = user_name.to_string();
        self.transact(move |prefs| {
            prefs.user_token = Some(token);
            prefs.user_id = Some(user_id);
            prefs.user_name = Some(user_name);
        })
        .await
    }

    // ========== Verification State ==========

    /// Current verification state. `EMPTY` when nothing is stored.
    pub async fn user_state(&self) -> UserVerificationState {
        self.snapshot().await.state()
    }

    /// Apply a local lifecycle transition.
    pub async fn apply_transition(&self, transition: Transition) -> StorageResult<StateUpdate> {
        let target = transition.target();
        self.update_state(|_| Some(target)).await
    }

    /// Conditionally replace the verification state.
    ///
    /// `decide` sees the state currently on disk under the store lock and
    /// returns the state to write, or `None` to leave it. Writing the state
    /// already stored is skipped.
    pub(crate) async fn update_state<F>(&self, decide: F) -> StorageResult<StateUpdate>
    where
        F: FnOnce(UserVerificationState) -> Option<UserVerificationState>,
    {
        self.transact(|prefs| {
            let previous = prefs.state();
            match decide(previous) {
                Some(next) if next != previous => {
                    prefs.user_state = Some(next.as_str().to_string());
                    StateUpdate {
                        previous,
                        current: next,
                        written: true,
                    }
                }
                _ => StateUpdate::unchanged(previous),
            }
        })
        .await
    }

    // ========== Documents ==========

    pub async fn documents_uploaded(&self) -> bool {
        self.snapshot().await.documents_uploaded
    }

    pub async fn save_documents_uploaded(&self, uploaded: bool) -> StorageResult<()> {
        self.transact(move |prefs| prefs.documents_uploaded = uploaded)
            .await
    }

    // ========== Profile ==========

    /// Stored user id. Non-positive ids mean "absent".
    pub async fn user_id(&self) -> Option<i64> {
        self.snapshot().await.user_id.filter(|id| *id > 0)
    }

    pub async fn save_user_id(&self, user_id: i64) -> StorageResult<()> {
        self.transact(move |prefs| prefs.user_id = Some(user_id)).await
    }

    pub async fn clear_user_id(&self) -> StorageResult<()> {
        self.transact(|prefs| prefs.user_id = None).await
    }

    pub async fn user_name(&self) -> Option<String> {
        self.snapshot().await.user_name
    }

    pub async fn save_user_name(&self, name: &str) -> StorageResult<()> {
        let name = name.to_string();
        self.transact(move |prefs| prefs.user_name = Some(name)).await
    }

    // ========== PIN Cache ==========

    /// Record that `user_id` just created a PIN.
    pub async fn mark_pin_created(&self, user_id: i64) -> StorageResult<()> {
        let now = Utc::now();
        self.transact(move |prefs| {
            prefs.pins_created.insert(user_id, now);
        })
        .await
    }

    /// When `user_id` last created a PIN on this device.
    pub async fn pin_created_at(&self, user_id: i64) -> Option<DateTime<Utc>> {
        self.snapshot().await.pins_created.get(&user_id).copied()
    }

    // ========== Logout ==========

    /// Wipe the whole session in a single write.
    pub async fn clear_all(&self) -> StorageResult<()> {
        self.transact(|prefs| *prefs = Preferences::default()).await
    }
}

/// Load the preferences, treating a corrupt file as an empty session.
fn load_or_reset(storage: &JsonFileStore) -> StorageResult<Preferences> {
    match storage.load::<Preferences>(&storage.paths().preferences()) {
        Ok(prefs) => Ok(prefs.unwrap_or_default()),
        Err(e @ StorageError::Corrupt { .. }) => {
            warn!(error = %e, "Preferences file is corrupt, starting with an empty session");
            Ok(Preferences::default())
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl TokenProvider for SessionStore {
    async fn token(&self) -> Option<String> {
        SessionStore::token(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use UserVerificationState::*;

    fn open_store(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::open(StoragePaths::new(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn fresh_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.token().await, None);
        assert_eq!(store.user_id().await, None);
        assert_eq!(store.user_state().await, Empty);
        assert!(!store.documents_uploaded().await);
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir);
            store.save_session("tok-1", 42, "Jane").await.unwrap();
            store.apply_transition(Transition::AccountCreated).await.unwrap();
            store.mark_pin_created(42).await.unwrap();
        }

        let store = open_store(&dir);
        assert_eq!(store.token().await.as_deref(), Some("tok-1"));
        assert_eq!(store.user_id().await, Some(42));
        assert_eq!(store.user_name().await.as_deref(), Some("Jane"));
        assert_eq!(store.user_state().await, Deactivated);
        assert!(store.pin_created_at(42).await.is_some());
        assert!(store.pin_created_at(7).await.is_none());
    }

    #[tokio::test]
    async fn login_from_another_handle_survives_state_write() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = open_store(&dir);
        let app = open_store(&dir);

        app.save_session("fresh-token", 7, "Ada").await.unwrap();
        assert_eq!(daemon.token().await.as_deref(), Some("fresh-token"));

        let update = daemon.update_state(|_| Some(Activated)).await.unwrap();
        assert!(update.written);

        let reopened = open_store(&dir);
        assert_eq!(reopened.token().await.as_deref(), Some("fresh-token"));
        assert_eq!(reopened.user_id().await, Some(7));
        assert_eq!(reopened.user_state().await, Activated);
        assert_eq!(app.user_state().await, Activated);
    }

    #[tokio::test]
    async fn write_after_logout_elsewhere_does_not_restore_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = open_store(&dir);
        app.save_session("old-token", 7, "Ada").await.unwrap();
        app.apply_transition(Transition::AccountCreated).await.unwrap();
        let daemon = open_store(&dir);
        assert_eq!(daemon.token().await.as_deref(), Some("old-token"));

        app.clear_all().await.unwrap();

        let tighten_only = |current: UserVerificationState| {
            Unverified.is_more_restrictive_than(current).then_some(Unverified)
        };
        let update = daemon.update_state(tighten_only).await.unwrap();
        assert_eq!(update.previous, Empty);
        assert!(!update.written);
        daemon.save_documents_uploaded(true).await.unwrap();

        let reopened = open_store(&dir);
        assert_eq!(reopened.token().await, None);
        assert_eq!(reopened.user_id().await, None);
        assert_eq!(reopened.user_state().await, Empty);
        assert!(reopened.documents_uploaded().await);
    }

    #[tokio::test]
    async fn stored_pin_digits_are_dropped_on_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("preferences.json");
        fs::write(&prefs_path, r#"{"user_token":"t","user_pins":{"42":"482913"}}"#).unwrap();

        let store = open_store(&dir);
        store.mark_pin_created(42).await.unwrap();

        let raw = fs::read_to_string(&prefs_path).unwrap();
        assert!(!raw.contains("482913"));
        assert_eq!(store.token().await.as_deref(), Some("t"));
        assert!(store.pin_created_at(42).await.is_some());
    }

    #[tokio::test]
    async fn non_positive_user_id_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.save_user_id(-1).await.unwrap();
        assert_eq!(store.user_id().await, None);
        store.save_user_id(0).await.unwrap();
        assert_eq!(store.user_id().await, None);
        store.save_user_id(9).await.unwrap();
        assert_eq!(store.user_id().await, Some(9));
        store.clear_user_id().await.unwrap();
        assert_eq!(store.user_id().await, None);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.save_session("tok", 5, "Sam").await.unwrap();
        store.save_documents_uploaded(true).await.unwrap();
        store.apply_transition(Transition::DocumentsUploaded).await.unwrap();

        store.clear_all().await.unwrap();

        assert_eq!(store.user_state().await, Empty);
        assert_eq!(store.token().await, None);
        assert_eq!(store.user_id().await, None);
        assert!(!store.documents_uploaded().await);

        let reopened = open_store(&dir);
        assert_eq!(reopened.user_state().await, Empty);
    }

    #[tokio::test]
    async fn unchanged_state_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let first = store.update_state(|_| Some(Activated)).await.unwrap();
        assert!(first.written);
        assert_eq!(first.previous, Empty);
        let second = store.update_state(|_| Some(Activated)).await.unwrap();
        assert!(!second.written);
        assert_eq!(store.revision(), 1);
    }

    #[tokio::test]
    async fn declined_update_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let update = store.update_state(|_| None).await.unwrap();
        assert_eq!(update, StateUpdate::unchanged(Empty));
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn unknown_stored_state_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("preferences.json"),
            r#"{"user_state":"PENDING","user_token":"t"}"#,
        )
        .unwrap();

        let store = open_store(&dir);
        assert_eq!(store.user_state().await, Empty);
        assert_eq!(store.token().await.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn corrupt_preferences_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("preferences.json"), b"{{{").unwrap();

        let store = open_store(&dir);
        assert_eq!(store.token().await, None);
    }

    #[tokio::test]
    async fn blank_token_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.save_token("  ").await.unwrap();
        assert_eq!(store.token().await, None);

        store.save_token("abc").await.unwrap();
        assert_eq!(TokenProvider::token(&store).await.as_deref(), Some("abc"));
        store.clear_token().await.unwrap();
        assert_eq!(store.token().await, None);
    }

    #[tokio::test]
    async fn debug_output_hides_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.save_session("secret-token", 1, "A").await.unwrap();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret-token"));
    }
}
