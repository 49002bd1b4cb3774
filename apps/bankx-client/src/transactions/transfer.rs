// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PIN-gated fund transfer submission.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::fees::{transaction_fee, transaction_type, TransactionType};
use crate::accounts::Bank;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{PinApi, TransactionsApi};
use crate::models::{TransactionDetails, TransactionRequest, TransactionResponse};
use crate::pin::{current_user_id, Pin, PinGate};
use crate::storage::{HistoryCache, SessionStore};

pub const DEFAULT_CURRENCY: &str = "KES";

/// What the user entered on the transfer form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferInput {
    pub sender_account: String,
    pub sender_phone: String,
    pub sender_bank_id: i32,
    pub receiver_account: String,
    pub receiver_phone: String,
    pub receiver_bank_id: i32,
    pub amount: f64,
    /// Empty means [`DEFAULT_CURRENCY`]
    pub currency: String,
    pub reference_note: String,
}

/// A validated transfer awaiting PIN entry.
///
/// Holds no PIN: one is attached only by [`TransferDraft::authorize`],
/// immediately before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDraft {
    details: TransactionDetails,
    transaction_type: TransactionType,
}

impl TransferDraft {
    /// Validate `input` and build the request details.
    ///
    /// `now_millis` seeds the client-side correlation id `TX<millis>`.
    pub fn prepare(input: &TransferInput, user_id: i64, now_millis: i64) -> ClientResult<Self> {
        if !input.amount.is_finite() || input.amount <= 0.0 {
            return Err(ClientError::validation("Amount must be greater than zero"));
        }

        let sender_account = input.sender_account.trim();
        let receiver_account = input.receiver_account.trim();
        if sender_account.is_empty() || receiver_account.is_empty() {
            return Err(ClientError::validation(
                "Sender and receiver accounts are required",
            ));
        }
        if sender_account == receiver_account {
            return Err(ClientError::validation(
                "Sender and receiver accounts must differ",
            ));
        }

        let sender_bank = supported_bank(input.sender_bank_id)?;
        let receiver_bank = supported_bank(input.receiver_bank_id)?;

        let currency = match input.currency.trim() {
            "" => DEFAULT_CURRENCY.to_string(),
            other => other.to_ascii_uppercase(),
        };
        let rail = transaction_type(Some(input.amount));

        Ok(Self {
            details: TransactionDetails {
                user_id,
                transaction_id: format!("TX{now_millis}"),
                transaction_type: rail.as_str().to_string(),
                sender_phone_no: input.sender_phone.trim().to_string(),
                sender_id: sender_account.to_string(),
                sender_bank_code: sender_bank.code().to_string(),
                receiver_id: receiver_account.to_string(),
                receiver_phone_no: input.receiver_phone.trim().to_string(),
                receiver_bank_code: receiver_bank.code().to_string(),
                amount: input.amount,
                currency,
                transaction_fee: transaction_fee(Some(input.amount)),
                reference_note: input.reference_note.trim().to_string(),
            },
            transaction_type: rail,
        })
    }

    pub fn details(&self) -> &TransactionDetails {
        &self.details
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn fee(&self) -> f64 {
        self.details.transaction_fee
    }

    /// Amount plus fee.
    pub fn total(&self) -> f64 {
        self.details.amount + self.details.transaction_fee
    }

    /// Attach the PIN, producing the wire request.
    pub(crate) fn authorize(&self, pin: &Pin) -> TransactionRequest {
        TransactionRequest {
            pin: pin.as_str().to_string(),
            transaction_request: self.details.clone(),
        }
    }
}

fn supported_bank(bank_id: i32) -> ClientResult<Bank> {
    Bank::from_id(bank_id)
        .ok_or_else(|| ClientError::validation(format!("Unsupported bank code: {bank_id}")))
}

/// Submits transfers for the logged-in user.
pub struct TransferService<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    pin_gate: Arc<PinGate<B>>,
    history_cache: Arc<HistoryCache>,
}

impl<B: PinApi + TransactionsApi> TransferService<B> {
    pub fn new(
        backend: Arc<B>,
        store: Arc<SessionStore>,
        pin_gate: Arc<PinGate<B>>,
        history_cache: Arc<HistoryCache>,
    ) -> Self {
        Self {
            backend,
            store,
            pin_gate,
            history_cache,
        }
    }

    /// Validate the form for the logged-in user.
    pub async fn prepare(&self, input: &TransferInput) -> ClientResult<TransferDraft> {
        let user_id = current_user_id(&self.store).await?;
        TransferDraft::prepare(input, user_id, Utc::now().timestamp_millis())
    }

    /// PIN gate, then submit.
    ///
    /// Anything but `SUCCESS` from the backend is a [`ClientError::Rejected`]
    /// carrying its message.
    pub async fn submit(&self, draft: &TransferDraft, pin: &str) -> ClientResult<TransactionResponse> {
        let pin = Pin::parse(pin)?;
        let user_id = draft.details.user_id;

        self.pin_gate.require_proceed(user_id).await?;

        let response = self
            .backend
            .initiate_transaction(&draft.authorize(&pin))
            .await?;

        if !response.is_success() {
            warn!(
                transaction_id = %response.transaction_id,
                status = %response.status,
                "Transfer rejected"
            );
            return Err(ClientError::Rejected(format!(
                "Transaction failed: {}",
                response.message
            )));
        }

        self.history_cache.invalidate(user_id);
        info!(
            transaction_id = %response.transaction_id,
            transaction_type = %draft.transaction_type,
            "Transfer submitted"
        );
        Ok(response)
    }
}
