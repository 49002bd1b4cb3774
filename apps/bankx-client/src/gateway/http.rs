// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP implementation of the backend gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{AccountsApi, AuthApi, DocumentsApi, PinApi, StatusApi, TransactionsApi};
use crate::auth::{bearer_header_value, TokenProvider};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ApiEnvelope, AuthPayload, BalanceResponse, DocumentFile, LinkAccountRequest, LinkedAccount,
    LoginRequest, PinRequest, SignUpRequest, TransactionHistoryPage, TransactionRequest,
    TransactionResponse,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// reqwest-backed client for the banking backend.
pub struct HttpBankingClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpBankingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBankingClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpBankingClient {
    /// Build a client for `base_url`, reading session tokens from `tokens`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> ClientResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid API base URL {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API base URL must be http(s): {base_url}"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Authorization` header value for the stored token, checked locally.
    async fn authorization(&self) -> ClientResult<String> {
        let token = self.tokens.token().await.unwrap_or_default();
        Ok(bearer_header_value(&token, Utc::now().timestamp())?)
    }

    /// Attach the bearer header, or fail before anything is sent.
    async fn authorized(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let header = self.authorization().await?;
        Ok(request.header("Authorization", header))
    }

    async fn send(request: RequestBuilder, label: &str) -> ClientResult<Response> {
        debug!(request = label, "Sending backend request");
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{label} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: format!("{label}: {}", body.trim()),
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder, label: &str) -> ClientResult<T> {
        Self::send(request, label)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("{label} invalid JSON: {e}")))
    }
}

/// Collapse a JSON payload into the text the UI displays.
fn payload_text(payload: Option<Value>) -> Option<String> {
    match payload? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn document_part(file: &DocumentFile) -> ClientResult<Part> {
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(file.media_type())
        .map_err(|e| ClientError::validation(format!("invalid document {}: {e}", file.file_name)))
}

#[async_trait]
impl AuthApi for HttpBankingClient {
    async fn login(&self, request: &LoginRequest) -> ClientResult<ApiEnvelope<AuthPayload>> {
        let builder = self.http.post(self.url("/kyc/auth/login")).json(request);
        Self::send_json(builder, "POST /kyc/auth/login").await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> ClientResult<ApiEnvelope<AuthPayload>> {
        let builder = self.http.post(self.url("/kyc/auth/register")).json(request);
        Self::send_json(builder, "POST /kyc/auth/register").await
    }
}

#[async_trait]
impl DocumentsApi for HttpBankingClient {
    async fn upload_documents(&self, id: &DocumentFile, kra: &DocumentFile) -> ClientResult<()> {
        let form = Form::new()
            .part("id", document_part(id)?)
            .part("kra", document_part(kra)?);
        let builder = self
            .authorized(self.http.post(self.url("/kyc/api/files/upload")))
            .await?
            .multipart(form);
        Self::send(builder, "POST /kyc/api/files/upload").await?;
        Ok(())
    }
}

#[async_trait]
impl StatusApi for HttpBankingClient {
    async fn fetch_upload_status(&self) -> ClientResult<Option<String>> {
        let label = "GET /kyc/upload/status";
        let builder = self
            .authorized(self.http.get(self.url("/kyc/upload/status")))
            .await?;
        let body = Self::send(builder, label).await?.text().await?;

        match serde_json::from_str::<ApiEnvelope<Value>>(&body) {
            Ok(envelope) => Ok(envelope
                .payload
                .and_then(|payload| payload.as_str().map(str::to_string))),
            Err(e) => {
                warn!(error = %e, "Status response body is not an envelope");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl AccountsApi for HttpBankingClient {
    async fn link_account(
        &self,
        request: &LinkAccountRequest,
    ) -> ClientResult<ApiEnvelope<String>> {
        let builder = self
            .authorized(self.http.post(self.url("/kyc/link")))
            .await?
            .json(request);
        let envelope: ApiEnvelope<Value> = Self::send_json(builder, "POST /kyc/link").await?;
        Ok(ApiEnvelope {
            status: envelope.status,
            message: envelope.message,
            payload: payload_text(envelope.payload),
        })
    }

    async fn linked_accounts(&self) -> ClientResult<ApiEnvelope<Vec<LinkedAccount>>> {
        let builder = self
            .authorized(self.http.get(self.url("/kyc/users/accounts")))
            .await?;
        Self::send_json(builder, "GET /kyc/users/accounts").await
    }

    async fn account_balance(
        &self,
        route: &str,
        account_number: &str,
        bank_id: i32,
    ) -> ClientResult<BalanceResponse> {
        let path = format!("/banking/{route}/transactions/balance");
        let bank_code = bank_id.to_string();
        let builder = self
            .authorized(self.http.get(self.url(&path)))
            .await?
            .query(&[("accountNumber", account_number), ("bankCode", &bank_code)]);
        Self::send_json(builder, &format!("GET {path}")).await
    }
}

#[async_trait]
impl PinApi for HttpBankingClient {
    async fn check_pin(&self, user_id: i64) -> ClientResult<bool> {
        let builder = self
            .authorized(self.http.post(self.url("/transactions/check-pin")))
            .await?
            .query(&[("user_id", user_id)]);
        Self::send_json(builder, "POST /transactions/check-pin").await
    }

    async fn save_pin(&self, request: &PinRequest) -> ClientResult<()> {
        let builder = self
            .authorized(self.http.post(self.url("/transactions/save-pin")))
            .await?
            .json(request);
        Self::send(builder, "POST /transactions/save-pin").await?;
        Ok(())
    }
}

#[async_trait]
impl TransactionsApi for HttpBankingClient {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse> {
        let builder = self
            .authorized(self.http.post(self.url("/transactions/initiate")))
            .await?
            .json(request);
        Self::send_json(builder, "POST /transactions/initiate").await
    }

    async fn transaction_history(
        &self,
        user_id: i64,
        page: u32,
        size: u32,
    ) -> ClientResult<TransactionHistoryPage> {
        let builder = self
            .authorized(self.http.get(self.url("/transactions/history")))
            .await?
            .query(&[("user_id", user_id), ("page", page.into()), ("size", size.into())]);
        Self::send_json(builder, "GET /transactions/history").await
    }
}
