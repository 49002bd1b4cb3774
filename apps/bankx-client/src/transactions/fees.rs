// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer fee schedule and settlement rail selection.

use serde::{Deserialize, Serialize};

/// Amounts up to this value settle over RTGS.
pub const RTGS_LIMIT: f64 = 500_000.0;

/// Fee brackets as (inclusive upper bound, flat fee).
const FEE_BRACKETS: [(f64, f64); 13] = [
    (100.0, 0.0),
    (500.0, 6.0),
    (1_000.0, 12.0),
    (1_500.0, 22.0),
    (2_500.0, 32.0),
    (3_500.0, 51.0),
    (5_000.0, 55.0),
    (7_500.0, 75.0),
    (10_000.0, 87.0),
    (15_000.0, 97.0),
    (20_000.0, 102.0),
    (35_000.0, 105.0),
    (50_000.0, 105.0),
];

/// Fee rate applied above the last bracket.
const PERCENTAGE_FEE_RATE: f64 = 0.02;

/// Settlement rail for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Rtgs,
    Eft,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Rtgs => "RTGS",
            TransactionType::Eft => "EFT",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fee charged for transferring `amount`.
///
/// Zero for absent or non-positive amounts; a flat fee up to 50 000; 2% of
/// the amount above that.
pub fn transaction_fee(amount: Option<f64>) -> f64 {
    let amount = match amount {
        Some(a) if a > 0.0 => a,
        _ => return 0.0,
    };

    FEE_BRACKETS
        .iter()
        .find(|(upper, _)| amount <= *upper)
        .map(|(_, fee)| *fee)
        .unwrap_or(amount * PERCENTAGE_FEE_RATE)
}

/// Rail for `amount`: RTGS up to and including 500 000, EFT above or when absent.
pub fn transaction_type(amount: Option<f64>) -> TransactionType {
    match amount {
        Some(a) if a <= RTGS_LIMIT => TransactionType::Rtgs,
        _ => TransactionType::Eft,
    }
}

/// Amount plus fee: what leaves the sender's account.
pub fn total_deduction(amount: f64) -> f64 {
    amount + transaction_fee(Some(amount))
}
