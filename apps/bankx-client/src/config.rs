// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BANKX_API_BASE_URL` | Banking backend base URL | `http://localhost:8080` |
//! | `BANKX_DATA_DIR` | Session store directory | `./bankx-data` |
//! | `BANKX_HTTP_TIMEOUT_SECS` | Per-request timeout | `15` |
//! | `BANKX_STATUS_POLL_SECS` | Periodic status sync interval | `60` |
//! | `BANKX_PIN_SUPPRESSION_SECS` | PIN check suppression after creation | `5` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//!
//! Blank values fall back to the default; numbers that do not parse are a
//! configuration error.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::gateway::http::DEFAULT_TIMEOUT;

pub const API_BASE_URL_ENV: &str = "BANKX_API_BASE_URL";
pub const DATA_DIR_ENV: &str = "BANKX_DATA_DIR";
pub const HTTP_TIMEOUT_ENV: &str = "BANKX_HTTP_TIMEOUT_SECS";
pub const STATUS_POLL_ENV: &str = "BANKX_STATUS_POLL_SECS";
pub const PIN_SUPPRESSION_ENV: &str = "BANKX_PIN_SUPPRESSION_SECS";

/// Logging format selector, read by the binary.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATA_DIR: &str = crate::storage::paths::DATA_ROOT;
const DEFAULT_STATUS_POLL_SECS: u64 = 60;
const DEFAULT_PIN_SUPPRESSION_SECS: u64 = 5;

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub status_poll_interval: Duration,
    pub pin_suppression: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: DEFAULT_TIMEOUT,
            status_poll_interval: Duration::from_secs(DEFAULT_STATUS_POLL_SECS),
            pin_suppression: Duration::from_secs(DEFAULT_PIN_SUPPRESSION_SECS),
        }
    }
}

impl ClientConfig {
    /// Load from the process environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let env_secs = |name: &str, default: u64| -> ClientResult<Duration> {
            match env_optional(name) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    ClientError::Config(format!("{name} must be a whole number of seconds, got {raw:?}"))
                }),
            }
        };

        let http_timeout = env_secs(HTTP_TIMEOUT_ENV, DEFAULT_TIMEOUT.as_secs())?;
        if http_timeout.is_zero() {
            return Err(ClientError::Config(format!("{HTTP_TIMEOUT_ENV} must be positive")));
        }
        let status_poll_interval = env_secs(STATUS_POLL_ENV, DEFAULT_STATUS_POLL_SECS)?;
        if status_poll_interval.is_zero() {
            return Err(ClientError::Config(format!("{STATUS_POLL_ENV} must be positive")));
        }

        Ok(Self {
            api_base_url: env_optional(API_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            data_dir: env_optional(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            http_timeout,
            status_poll_interval,
            pin_suppression: env_secs(PIN_SUPPRESSION_ENV, DEFAULT_PIN_SUPPRESSION_SECS)?,
        })
    }
}
