// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transactions
//!
//! - [`fees`]: fee schedule and RTGS/EFT selection
//! - [`transfer`]: validated drafts and PIN-gated submission
//! - [`history`]: paginated history with a cached first page

pub mod fees;
pub mod history;
pub mod transfer;

pub use fees::{total_deduction, transaction_fee, transaction_type, TransactionType};
pub use history::{HistoryService, DEFAULT_PAGE_SIZE};
pub use transfer::{TransferDraft, TransferInput, TransferService};
