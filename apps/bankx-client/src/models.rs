// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend Data Models
//!
//! Request and response bodies exchanged with the banking backend. Field
//! names follow the backend's JSON exactly, which mixes `snake_case` and
//! `camelCase` from one endpoint to the next.
//!
//! ## Model Categories
//!
//! - **Envelope**: the `{status, message, payload}` wrapper most KYC endpoints use
//! - **Auth**: login and registration
//! - **Accounts**: linking, listing and balances
//! - **Transactions**: transfer requests, results and history pages
//! - **Documents**: KYC image uploads
//!
//! Types carrying a PIN implement `Debug` by hand so the PIN never reaches a
//! log line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Envelope
// =============================================================================

/// Standard response wrapper of the KYC service.
///
/// `status` mirrors an HTTP code inside the body (`200`, `409`, ...) and is
/// independent of the transport status.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub payload: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Whether the body-level status reports success.
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }

    /// Body message, or `fallback` when the backend sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

// =============================================================================
// Auth Models
// =============================================================================

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration body.
#[derive(Clone, Serialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: String,
    pub password: String,
    /// Role requested for the new account; always `USER` from the app
    pub authorities: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("phone_no", &self.phone_no)
            .finish_non_exhaustive()
    }
}

/// Payload of a login or registration response.
#[derive(Clone, Default, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Sent as a string by the backend; numbers are accepted too
    #[serde(default)]
    pub id: Option<Value>,
}

impl AuthPayload {
    /// User id, or `-1` when absent or unparsable.
    pub fn user_id(&self) -> i64 {
        match &self.id {
            Some(Value::String(s)) => s.trim().parse().unwrap_or(-1),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
            _ => -1,
        }
    }

    /// Display name, or `"User"` when absent.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "User".to_string())
    }
}

/// A session established by login or signup.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub token: String,
    pub user_id: i64,
    pub user_name: String,
}

impl std::fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Account Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkAccountRequest {
    #[serde(rename = "bankId")]
    pub bank_id: i32,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
}

/// Linked account as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedAccount {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "bankId")]
    pub bank_id: i32,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceResponse {
    pub currency: String,
    pub balance: f64,
}

// =============================================================================
// PIN Models
// =============================================================================

#[derive(Clone, Serialize)]
pub struct PinRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub pin: String,
}

impl std::fmt::Debug for PinRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinRequest")
            .field("user_id", &self.user_id)
            .field("pin", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Transaction Models
// =============================================================================

/// Transfer details, as sent on initiation and returned in history pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransactionDetails {
    pub user_id: i64,
    pub transaction_id: String,
    #[serde(rename = "transactionType")]
    pub transaction_type: String,
    pub sender_phone_no: String,
    pub sender_id: String,
    pub sender_bank_code: String,
    pub receiver_id: String,
    pub receiver_phone_no: String,
    pub receiver_bank_code: String,
    pub amount: f64,
    pub currency: String,
    pub transaction_fee: f64,
    pub reference_note: String,
}

/// Body of `POST /transactions/initiate`.
#[derive(Clone, Serialize)]
pub struct TransactionRequest {
    pub pin: String,
    #[serde(rename = "transactionRequest")]
    pub transaction_request: TransactionDetails,
}

impl std::fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("pin", &"<redacted>")
            .field("transaction_request", &self.transaction_request)
            .finish()
    }
}

/// Result of a transfer initiation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub transaction_fee: f64,
    #[serde(default)]
    pub confirmation_code: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl TransactionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

/// One page of transaction history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistoryPage {
    pub size: u32,
    pub total_pages: u32,
    pub page: u32,
    #[serde(default)]
    pub content: Vec<TransactionDetails>,
    pub total_elements: u64,
}

// =============================================================================
// Document Models
// =============================================================================

/// Extensions accepted for KYC images.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// A KYC document picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn is_image(&self) -> bool {
        self.extension()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// MIME type sent with the multipart part.
    pub fn media_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
