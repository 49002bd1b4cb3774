// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Verification State Machine
//!
//! Maps the user's KYC status to one of five states and the UI gating each
//! state implies.
//!
//! ## Transition Authority
//!
//! | From | To | Driven by |
//! |------|----|-----------|
//! | `EMPTY` | `DEACTIVATED` | account creation ([`Transition::AccountCreated`]) |
//! | any | `UNVERIFIED` | successful document upload ([`Transition::DocumentsUploaded`]) |
//! | any | any | status synchronizer (backend truth) |
//! | any | `EMPTY` | logout (store cleared) |
//!
//! No [`Transition`] targets `ACTIVATED` or `ARCHIVED`: only the status
//! synchronizer can write those, through a crate-private store method.

use serde::{Deserialize, Serialize};

/// KYC verification state of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserVerificationState {
    /// Account created, KYC documents not uploaded yet
    Deactivated,
    /// Documents uploaded, pending backend review
    Unverified,
    /// Verified; full feature access
    Activated,
    /// Account closed or suspended
    Archived,
    /// Nothing recorded yet (fresh install, before the first fetch)
    #[default]
    Empty,
}

impl UserVerificationState {
    /// Wire/storage name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deactivated => "DEACTIVATED",
            Self::Unverified => "UNVERIFIED",
            Self::Activated => "ACTIVATED",
            Self::Archived => "ARCHIVED",
            Self::Empty => "EMPTY",
        }
    }

    /// Parse a stored state name. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "DEACTIVATED" => Some(Self::Deactivated),
            "UNVERIFIED" => Some(Self::Unverified),
            "ACTIVATED" => Some(Self::Activated),
            "ARCHIVED" => Some(Self::Archived),
            "EMPTY" => Some(Self::Empty),
            _ => None,
        }
    }

    /// Map the status string returned by the backend.
    ///
    /// Only `ACTIVATED` and `UNVERIFIED` are recognized; anything else,
    /// including a missing value, is `DEACTIVATED`.
    pub fn from_remote_status(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("ACTIVATED") => Self::Activated,
            Some("UNVERIFIED") => Self::Unverified,
            _ => Self::Deactivated,
        }
    }

    /// Rank used to resolve conflicting observations; higher is stricter.
    pub fn restrictiveness(&self) -> u8 {
        match self {
            Self::Activated => 0,
            Self::Unverified => 1,
            Self::Deactivated | Self::Empty => 2,
            Self::Archived => 3,
        }
    }

    /// Whether `self` grants strictly less access than `other`.
    pub fn is_more_restrictive_than(&self, other: Self) -> bool {
        self.restrictiveness() > other.restrictiveness()
    }

    /// UI gating implied by this state.
    pub fn gating(&self) -> Gating {
        Gating { state: *self }
    }
}

impl std::fmt::Display for UserVerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screens the UI shell can navigate to from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    FundTransfer,
    Accounts,
    LinkAccount,
    TransactionHistory,
    DocumentUpload,
    Notifications,
}

impl NavigationTarget {
    pub const ALL: [NavigationTarget; 6] = [
        NavigationTarget::FundTransfer,
        NavigationTarget::Accounts,
        NavigationTarget::LinkAccount,
        NavigationTarget::TransactionHistory,
        NavigationTarget::DocumentUpload,
        NavigationTarget::Notifications,
    ];

    /// Targets that require a verified account.
    fn requires_activation(&self) -> bool {
        matches!(
            self,
            NavigationTarget::FundTransfer
                | NavigationTarget::Accounts
                | NavigationTarget::LinkAccount
                | NavigationTarget::TransactionHistory
        )
    }
}

/// Dialog the UI shell shows for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Ask the user to upload their KYC documents
    UploadDocuments,
    /// Documents received, review pending
    AwaitingVerification,
    /// Terminal notice: nothing can be done in-app
    ContactSupport,
}

/// Navigation gating for one verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gating {
    state: UserVerificationState,
}

impl Gating {
    pub fn state(&self) -> UserVerificationState {
        self.state
    }

    /// Whether the UI may navigate to `target`.
    pub fn allows(&self, target: NavigationTarget) -> bool {
        match self.state {
            UserVerificationState::Activated => true,
            UserVerificationState::Deactivated | UserVerificationState::Empty => {
                !target.requires_activation()
            }
            UserVerificationState::Unverified => target == NavigationTarget::Notifications,
            UserVerificationState::Archived => false,
        }
    }

    /// All targets enabled in this state.
    pub fn enabled_targets(&self) -> Vec<NavigationTarget> {
        NavigationTarget::ALL
            .into_iter()
            .filter(|target| self.allows(*target))
            .collect()
    }

    /// The prompt associated with this state, if any.
    ///
    /// `EMPTY` has none: it means the first status fetch has not resolved.
    pub fn prompt(&self) -> Option<Prompt> {
        match self.state {
            UserVerificationState::Deactivated => Some(Prompt::UploadDocuments),
            UserVerificationState::Unverified => Some(Prompt::AwaitingVerification),
            UserVerificationState::Archived => Some(Prompt::ContactSupport),
            UserVerificationState::Activated | UserVerificationState::Empty => None,
        }
    }
}

/// Local state transitions the client may apply on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Signup succeeded; documents are still outstanding
    AccountCreated,
    /// Upload succeeded; optimistic move to pending review
    DocumentsUploaded,
}

impl Transition {
    pub fn target(&self) -> UserVerificationState {
        match self {
            Transition::AccountCreated => UserVerificationState::Deactivated,
            Transition::DocumentsUploaded => UserVerificationState::Unverified,
        }
    }
}

/// Emits a state's prompt once per entry into that state.
///
/// Re-rendering the same state does not repeat the prompt; leaving and
/// re-entering does.
#[derive(Debug, Default)]
pub struct PromptTracker {
    last_seen: Option<UserVerificationState>,
}

impl PromptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current state and return the prompt to show, if the
    /// state was just entered.
    pub fn observe(&mut self, state: UserVerificationState) -> Option<Prompt> {
        let entered = self.last_seen != Some(state);
        self.last_seen = Some(state);
        if entered {
            state.gating().prompt()
        } else {
            None
        }
    }

    /// Forget the last state (used on logout).
    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}
