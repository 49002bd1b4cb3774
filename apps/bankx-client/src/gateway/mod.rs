// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend Gateway
//!
//! One async method per backend endpoint, split into traits by concern so
//! each service depends only on the calls it makes. [`HttpBankingClient`]
//! implements all of them over HTTP; tests substitute in-memory fakes.
//!
//! ## Error Contract
//!
//! | Situation | Result |
//! |-----------|--------|
//! | no/expired token on an authenticated call | `ClientError::AuthUnavailable`, nothing sent |
//! | non-2xx response | `ClientError::Http { status, .. }` |
//! | connect/timeout failure | `ClientError::Transport` |
//! | 2xx with an unreadable body | `ClientError::InvalidResponse` |
//!
//! The status endpoint is the exception to the last row: an unreadable 2xx
//! body yields `Ok(None)`, which maps to `DEACTIVATED`.

pub mod http;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{
    ApiEnvelope, AuthPayload, BalanceResponse, DocumentFile, LinkAccountRequest, LinkedAccount,
    LoginRequest, PinRequest, SignUpRequest, TransactionHistoryPage, TransactionRequest,
    TransactionResponse,
};

pub use http::HttpBankingClient;

/// Unauthenticated login and registration.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ClientResult<ApiEnvelope<AuthPayload>>;

    async fn sign_up(&self, request: &SignUpRequest) -> ClientResult<ApiEnvelope<AuthPayload>>;
}

#[async_trait]
pub trait DocumentsApi: Send + Sync {
    /// Upload the ID and KRA images as the `id` and `kra` multipart parts.
    async fn upload_documents(&self, id: &DocumentFile, kra: &DocumentFile) -> ClientResult<()>;
}

#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Raw KYC status string from the `payload` field, if present.
    async fn fetch_upload_status(&self) -> ClientResult<Option<String>>;
}

#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn link_account(&self, request: &LinkAccountRequest)
        -> ClientResult<ApiEnvelope<String>>;

    async fn linked_accounts(&self) -> ClientResult<ApiEnvelope<Vec<LinkedAccount>>>;

    /// Balance of one account, routed by the bank's path segment.
    async fn account_balance(
        &self,
        route: &str,
        account_number: &str,
        bank_id: i32,
    ) -> ClientResult<BalanceResponse>;
}

#[async_trait]
pub trait PinApi: Send + Sync {
    /// Whether a transaction PIN exists for `user_id`.
    async fn check_pin(&self, user_id: i64) -> ClientResult<bool>;

    async fn save_pin(&self, request: &PinRequest) -> ClientResult<()>;
}

#[async_trait]
pub trait TransactionsApi: Send + Sync {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse>;

    async fn transaction_history(
        &self,
        user_id: i64,
        page: u32,
        size: u32,
    ) -> ClientResult<TransactionHistoryPage>;
}

/// The full backend surface.
pub trait BankingBackend:
    AuthApi + DocumentsApi + StatusApi + AccountsApi + PinApi + TransactionsApi
{
}

impl<T> BankingBackend for T where
    T: AuthApi + DocumentsApi + StatusApi + AccountsApi + PinApi + TransactionsApi
{
}
