// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory backend and store helpers shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthError;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{AccountsApi, AuthApi, DocumentsApi, PinApi, StatusApi, TransactionsApi};
use crate::models::{
    ApiEnvelope, AuthPayload, BalanceResponse, DocumentFile, LinkAccountRequest, LinkedAccount,
    LoginRequest, PinRequest, SignUpRequest, TransactionHistoryPage, TransactionRequest,
    TransactionResponse,
};
use crate::storage::{SessionStore, StoragePaths};

/// A store in a fresh temp dir holding a session for user 42.
pub async fn temp_store() -> (tempfile::TempDir, Arc<SessionStore>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SessionStore::open(StoragePaths::new(dir.path())).expect("open store");
    store
        .save_session("test-token", 42, "Test User")
        .await
        .expect("save session");
    (dir, Arc::new(store))
}

/// Scripted reply of the status endpoint.
#[derive(Debug, Clone, Copy)]
pub enum StatusReply {
    Status(Option<&'static str>),
    HttpError(u16),
    Transport,
    AuthUnavailable,
}

impl StatusReply {
    fn into_result(self) -> ClientResult<Option<String>> {
        match self {
            StatusReply::Status(status) => Ok(status.map(str::to_string)),
            StatusReply::HttpError(status) => Err(http_error(status)),
            StatusReply::Transport => Err(ClientError::Transport("connection refused".to_string())),
            StatusReply::AuthUnavailable => Err(ClientError::AuthUnavailable(AuthError::MissingToken)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum PinReply {
    #[default]
    Exists,
    Missing,
    Error(u16),
}

fn http_error(status: u16) -> ClientError {
    ClientError::Http {
        status,
        message: format!("HTTP {status}"),
    }
}

struct AuthReply {
    token: Option<String>,
    name: Option<String>,
    id: Option<String>,
}

/// Backend double implementing every gateway trait.
///
/// Replies are scripted through the setters; counters record how often
/// each endpoint was hit.
pub struct FakeBackend {
    status_queue: Mutex<VecDeque<StatusReply>>,
    default_status: Mutex<StatusReply>,
    status_calls: AtomicUsize,
    pin_reply: Mutex<PinReply>,
    pub pin_checks: AtomicUsize,
    pub saved_pins: AtomicUsize,
    pub fail_save_pin: AtomicBool,
    pub uploads: AtomicUsize,
    pub fail_upload: AtomicBool,
    pub transactions: AtomicUsize,
    pub history_calls: AtomicUsize,
    transaction_reply: Mutex<(String, String)>,
    link_reply: Mutex<(i32, String)>,
    accounts: Mutex<Vec<LinkedAccount>>,
    balances: Mutex<HashMap<String, BalanceResponse>>,
    auth_reply: Mutex<AuthReply>,
    auth_calls: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            status_queue: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(StatusReply::Status(Some("UNVERIFIED"))),
            status_calls: AtomicUsize::new(0),
            pin_reply: Mutex::new(PinReply::default()),
            pin_checks: AtomicUsize::new(0),
            saved_pins: AtomicUsize::new(0),
            fail_save_pin: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
            fail_upload: AtomicBool::new(false),
            transactions: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            transaction_reply: Mutex::new(("SUCCESS".to_string(), "Transfer complete".to_string())),
            link_reply: Mutex::new((200, "Account linked".to_string())),
            accounts: Mutex::new(Vec::new()),
            balances: Mutex::new(HashMap::new()),
            auth_reply: Mutex::new(AuthReply {
                token: Some("fake-token".to_string()),
                name: Some("Test User".to_string()),
                id: Some("42".to_string()),
            }),
            auth_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeBackend {
    /// Queue a one-off status reply, served before the default.
    pub fn push_status(&self, reply: StatusReply) {
        self.status_queue.lock().unwrap().push_back(reply);
    }

    pub fn set_default_status(&self, reply: StatusReply) {
        *self.default_status.lock().unwrap() = reply;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn set_pin_reply(&self, reply: PinReply) {
        *self.pin_reply.lock().unwrap() = reply;
    }

    pub fn set_transaction_status(&self, status: &str, message: &str) {
        *self.transaction_reply.lock().unwrap() = (status.to_string(), message.to_string());
    }

    pub fn set_link_reply(&self, status: i32, message: &str) {
        *self.link_reply.lock().unwrap() = (status, message.to_string());
    }

    pub fn set_accounts(&self, accounts: Vec<LinkedAccount>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_balance(&self, account_number: &str, currency: &str, balance: f64) {
        self.balances.lock().unwrap().insert(
            account_number.to_string(),
            BalanceResponse {
                currency: currency.to_string(),
                balance,
            },
        );
    }

    pub fn set_auth_payload(&self, token: Option<&str>, name: Option<&str>, id: Option<&str>) {
        *self.auth_reply.lock().unwrap() = AuthReply {
            token: token.map(str::to_string),
            name: name.map(str::to_string),
            id: id.map(str::to_string),
        };
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    fn auth_envelope(&self) -> ApiEnvelope<AuthPayload> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.auth_reply.lock().unwrap();
        ApiEnvelope {
            status: Some(200),
            message: Some("ok".to_string()),
            payload: Some(AuthPayload {
                token: reply.token.clone(),
                name: reply.name.clone(),
                id: reply.id.clone().map(Value::String),
            }),
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, _request: &LoginRequest) -> ClientResult<ApiEnvelope<AuthPayload>> {
        Ok(self.auth_envelope())
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> ClientResult<ApiEnvelope<AuthPayload>> {
        Ok(self.auth_envelope())
    }
}

#[async_trait]
impl DocumentsApi for FakeBackend {
    async fn upload_documents(&self, _id: &DocumentFile, _kra: &DocumentFile) -> ClientResult<()> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(http_error(500));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl StatusApi for FakeBackend {
    async fn fetch_upload_status(&self) -> ClientResult<Option<String>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.status_queue.lock().unwrap().pop_front();
        let reply = queued.unwrap_or_else(|| *self.default_status.lock().unwrap());
        reply.into_result()
    }
}

#[async_trait]
impl AccountsApi for FakeBackend {
    async fn link_account(
        &self,
        _request: &LinkAccountRequest,
    ) -> ClientResult<ApiEnvelope<String>> {
        let (status, message) = self.link_reply.lock().unwrap().clone();
        Ok(ApiEnvelope {
            status: Some(status),
            payload: (status == 200).then(|| message.clone()),
            message: Some(message),
        })
    }

    async fn linked_accounts(&self) -> ClientResult<ApiEnvelope<Vec<LinkedAccount>>> {
        Ok(ApiEnvelope {
            status: Some(200),
            message: None,
            payload: Some(self.accounts.lock().unwrap().clone()),
        })
    }

    async fn account_balance(
        &self,
        _route: &str,
        account_number: &str,
        _bank_id: i32,
    ) -> ClientResult<BalanceResponse> {
        self.balances
            .lock()
            .unwrap()
            .get(account_number)
            .cloned()
            .ok_or_else(|| http_error(404))
    }
}

#[async_trait]
impl PinApi for FakeBackend {
    async fn check_pin(&self, _user_id: i64) -> ClientResult<bool> {
        self.pin_checks.fetch_add(1, Ordering::SeqCst);
        match *self.pin_reply.lock().unwrap() {
            PinReply::Exists => Ok(true),
            PinReply::Missing => Ok(false),
            PinReply::Error(status) => Err(http_error(status)),
        }
    }

    async fn save_pin(&self, _request: &PinRequest) -> ClientResult<()> {
        if self.fail_save_pin.load(Ordering::SeqCst) {
            return Err(http_error(400));
        }
        self.saved_pins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TransactionsApi for FakeBackend {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let (status, message) = self.transaction_reply.lock().unwrap().clone();
        Ok(TransactionResponse {
            transaction_id: request.transaction_request.transaction_id.clone(),
            status,
            message,
            transaction_fee: request.transaction_request.transaction_fee,
            confirmation_code: Some("CONF-1".to_string()),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        })
    }

    async fn transaction_history(
        &self,
        _user_id: i64,
        page: u32,
        size: u32,
    ) -> ClientResult<TransactionHistoryPage> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHistoryPage {
            size,
            page,
            ..Default::default()
        })
    }
}
