// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Layout of the client data directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DATA_ROOT: &str = "./bankx-data";

const PREFERENCES_FILE: &str = "preferences.json";
const PROBE_FILE: &str = ".probe";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The session document.
    pub fn preferences(&self) -> PathBuf {
        self.root.join(PREFERENCES_FILE)
    }

    pub fn health_check_file(&self) -> PathBuf {
        self.root.join(PROBE_FILE)
    }

    /// Held while a process rewrites the session document.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Sibling of `target` used while a new version is written.
    pub fn staging_for(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".partial");
        target.with_file_name(name)
    }
}
