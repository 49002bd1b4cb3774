// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Linked Bank Accounts
//!
//! Linking, listing and balance lookups for the user's bank accounts.
//!
//! ## Supported Banks
//!
//! | Id | Name | Transfer code | Balance route |
//! |----|------|---------------|---------------|
//! | 1 | KCB BANK | `KCB` | `kcb` |
//! | 2 | FAMILY BANK | `FAMILY` | `family` |
//! | 3 | ABSA BANK | `ABSA` | `absa` |
//!
//! Accounts at other banks are listed as "Unknown Bank" but cannot be used
//! for balances or transfers.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::AccountsApi;
use crate::models::{LinkAccountRequest, LinkedAccount};

/// Balance shown before the first successful fetch.
pub const DEFAULT_BALANCE: &str = "KES 0.00";

/// A bank the backend can route balances and transfers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    Kcb,
    Family,
    Absa,
}

impl Bank {
    pub const ALL: [Bank; 3] = [Bank::Kcb, Bank::Family, Bank::Absa];

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Bank::Kcb),
            2 => Some(Bank::Family),
            3 => Some(Bank::Absa),
            _ => None,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Bank::Kcb => 1,
            Bank::Family => 2,
            Bank::Absa => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bank::Kcb => "KCB BANK",
            Bank::Family => "FAMILY BANK",
            Bank::Absa => "ABSA BANK",
        }
    }

    /// Code used in transfer requests.
    pub fn code(&self) -> &'static str {
        match self {
            Bank::Kcb => "KCB",
            Bank::Family => "FAMILY",
            Bank::Absa => "ABSA",
        }
    }

    /// Path segment of the balance endpoint.
    pub fn route(&self) -> &'static str {
        match self {
            Bank::Kcb => "kcb",
            Bank::Family => "family",
            Bank::Absa => "absa",
        }
    }
}

/// Display name for a bank id.
pub fn bank_name(bank_id: i32) -> &'static str {
    Bank::from_id(bank_id).map_or("Unknown Bank", |bank| bank.name())
}

/// A linked account as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub bank_id: i32,
    pub bank_name: String,
    pub account_number: String,
    /// Formatted balance, e.g. `KES 1250.00`
    pub balance: String,
}

impl Account {
    pub fn bank(&self) -> Option<Bank> {
        Bank::from_id(self.bank_id)
    }
}

impl From<LinkedAccount> for Account {
    fn from(linked: LinkedAccount) -> Self {
        Self {
            bank_id: linked.bank_id,
            bank_name: bank_name(linked.bank_id).to_string(),
            account_number: linked.account_number,
            balance: DEFAULT_BALANCE.to_string(),
        }
    }
}

/// Convert backend accounts, keeping the first of each account number.
pub fn dedupe_accounts(linked: Vec<LinkedAccount>) -> Vec<Account> {
    let mut seen = HashSet::new();
    linked
        .into_iter()
        .filter(|account| seen.insert(account.account_number.clone()))
        .map(Account::from)
        .collect()
}

/// `"<CURRENCY> <amount>"` with two decimals.
pub fn format_balance(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

/// Transfer code of the bank holding `account_number`.
pub fn bank_code_for(account_number: &str, accounts: &[Account]) -> ClientResult<&'static str> {
    let account = accounts
        .iter()
        .find(|account| account.account_number == account_number)
        .ok_or_else(|| {
            ClientError::validation(format!("Account {account_number} is not linked"))
        })?;

    account
        .bank()
        .map(|bank| bank.code())
        .ok_or_else(|| ClientError::validation(format!("Unsupported bank code: {}", account.bank_id)))
}

/// Account operations against the backend.
pub struct AccountService<B> {
    backend: Arc<B>,
}

impl<B: AccountsApi> AccountService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Link `account_number` at `bank`. Returns the backend's confirmation text.
    pub async fn link_account(&self, bank: Bank, account_number: &str) -> ClientResult<String> {
        let account_number = account_number.trim();
        if account_number.is_empty() {
            return Err(ClientError::validation("Account number is required"));
        }

        let envelope = self
            .backend
            .link_account(&LinkAccountRequest {
                bank_id: bank.id(),
                account_number: account_number.to_string(),
            })
            .await?;

        if envelope.is_ok() {
            debug!(bank = bank.code(), "Account linked");
            Ok(envelope
                .payload
                .unwrap_or_else(|| "Account linked successfully.".to_string()))
        } else {
            Err(ClientError::Rejected(
                envelope.message_or("Failed to link account."),
            ))
        }
    }

    /// Linked accounts, de-duplicated by account number.
    pub async fn linked_accounts(&self) -> ClientResult<Vec<Account>> {
        let envelope = self.backend.linked_accounts().await?;
        if !envelope.is_ok() {
            return Err(ClientError::Rejected(format!(
                "Failed to fetch accounts: {}",
                envelope.message_or("Unknown error")
            )));
        }
        Ok(dedupe_accounts(envelope.payload.unwrap_or_default()))
    }

    /// Formatted balance of one account.
    pub async fn balance(&self, account: &Account) -> ClientResult<String> {
        let bank = account.bank().ok_or_else(|| {
            ClientError::validation(format!("Unsupported bank code: {}", account.bank_id))
        })?;
        let response = self
            .backend
            .account_balance(bank.route(), &account.account_number, bank.id())
            .await?;
        Ok(format_balance(&response.currency, response.balance))
    }

    /// Refresh every account's balance in place.
    ///
    /// A failed lookup keeps the previous value. Returns how many succeeded.
    pub async fn refresh_balances(&self, accounts: &mut [Account]) -> usize {
        let mut refreshed = 0;
        for account in accounts.iter_mut() {
            match self.balance(account).await {
                Ok(balance) => {
                    account.balance = balance;
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(
                        bank_id = account.bank_id,
                        error = %e,
                        "Balance fetch failed, keeping cached value"
                    );
                }
            }
        }
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;

    fn linked(id: i64, bank_id: i32, number: &str) -> LinkedAccount {
        LinkedAccount {
            id,
            bank_id,
            account_number: number.to_string(),
        }
    }

    #[test]
    fn bank_table() {
        for bank in Bank::ALL {
            assert_eq!(Bank::from_id(bank.id()), Some(bank));
        }
        assert_eq!(Bank::Family.code(), "FAMILY");
        assert_eq!(Bank::Absa.route(), "absa");
        assert_eq!(bank_name(9), "Unknown Bank");
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let accounts = dedupe_accounts(vec![
            linked(1, 1, "111"),
            linked(2, 2, "222"),
            linked(3, 3, "111"),
        ]);
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].bank_name, "KCB BANK");
        assert_eq!(accounts[0].balance, DEFAULT_BALANCE);
        assert_eq!(accounts[1].account_number, "222");
    }

    #[test]
    fn balance_has_two_decimals() {
        assert_eq!(format_balance("KES", 1250.0), "KES 1250.00");
        assert_eq!(format_balance("USD", 3.456), "USD 3.46");
    }

    #[test]
    fn bank_code_lookup() {
        let accounts = dedupe_accounts(vec![linked(1, 2, "222"), linked(2, 7, "777")]);
        assert_eq!(bank_code_for("222", &accounts).unwrap(), "FAMILY");
        assert!(bank_code_for("777", &accounts).is_err());
        assert!(bank_code_for("999", &accounts).is_err());
    }

    #[tokio::test]
    async fn link_account_reports_backend_rejection() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_link_reply(409, "Error occurred");
        let service = AccountService::new(backend);

        let err = service.link_account(Bank::Kcb, "12345").await.unwrap_err();
        assert_eq!(err.to_string(), "Error occurred");
    }

    #[tokio::test]
    async fn link_account_requires_number() {
        let service = AccountService::new(Arc::new(FakeBackend::default()));
        assert!(matches!(
            service.link_account(Bank::Kcb, "  ").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn linked_accounts_are_deduplicated() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_accounts(vec![linked(1, 1, "111"), linked(2, 1, "111")]);
        let service = AccountService::new(backend);

        let accounts = service.linked_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[tokio::test]
    async fn failed_balance_keeps_previous_value() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_balance("111", "KES", 1500.5);
        let service = AccountService::new(backend);

        let mut accounts = dedupe_accounts(vec![linked(1, 1, "111"), linked(2, 1, "222")]);
        accounts[1].balance = "KES 10.00".to_string();

        let refreshed = service.refresh_balances(&mut accounts).await;
        assert_eq!(refreshed, 1);
        assert_eq!(accounts[0].balance, "KES 1500.50");
        assert_eq!(accounts[1].balance, "KES 10.00");
    }
}
