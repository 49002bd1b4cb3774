// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signup form validation.
//!
//! Checks run on the device before the registration request is built. A
//! failure names the first offending field and is never retried.

use crate::error::{ClientError, ClientResult};
use crate::models::SignUpRequest;

const PASSWORD_SPECIALS: &str = "@$!%*?&#";
const MIN_PASSWORD_LENGTH: usize = 8;

/// Role requested for accounts created from the app.
const USER_AUTHORITY: &str = "USER";

/// Letters and whitespace only, and not blank.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
}

/// `local@domain.tld` with a `[A-Za-z0-9._-]` local part and lowercase
/// domain labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    local_ok && is_valid_domain(domain)
}

/// One lowercase label, one or more dots, one lowercase label.
fn is_valid_domain(domain: &str) -> bool {
    let label_end = domain
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(domain.len());
    if label_end == 0 {
        return false;
    }

    let rest = &domain[label_end..];
    let tld = rest.trim_start_matches('.');
    rest.len() > tld.len() && !tld.is_empty() && tld.chars().all(|c| c.is_ascii_lowercase())
}

/// 10 to 12 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    (10..=12).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
}

/// At least 8 characters from `[A-Za-z0-9@$!%*?&#]`, with one of each class.
pub fn is_valid_password(password: &str) -> bool {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));

    allowed
        && password.len() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// The signup form as entered.
#[derive(Clone, Default)]
pub struct SignUpForm {
    pub first_name: String,
    /// Optional
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    /// Validate every field and build the registration request.
    pub fn validate(&self) -> ClientResult<SignUpRequest> {
        let middle_name = self.middle_name.trim();

        if !is_valid_name(&self.first_name)
            || !is_valid_name(&self.last_name)
            || !(middle_name.is_empty() || is_valid_name(middle_name))
        {
            return Err(ClientError::validation("Name must contain only letters"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ClientError::validation("Enter a valid email address"));
        }
        if !is_valid_phone(self.phone_no.trim()) {
            return Err(ClientError::validation("Enter a valid phone number"));
        }
        if !is_valid_password(&self.password) {
            return Err(ClientError::validation(
                "Password must contain at least 8 characters, including uppercase, lowercase, numbers, and special characters",
            ));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation("Passwords do not match"));
        }

        Ok(SignUpRequest {
            first_name: self.first_name.trim().to_string(),
            middle_name: middle_name.to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_no: self.phone_no.trim().to_string(),
            password: self.password.clone(),
            authorities: USER_AUTHORITY.to_string(),
        })
    }
}
