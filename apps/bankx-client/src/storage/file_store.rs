// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON documents in the client data directory.
//!
//! Confidentiality at rest belongs to the platform (app sandbox storage on
//! mobile, an encrypted volume for the daemon). This layer only guarantees
//! that a document on disk is either the previous version or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::StoragePaths;

const PROBE_BYTES: &[u8] = b"bankx-probe";

#[derive(Debug)]
pub enum StorageError {
    /// A filesystem call on `path` failed
    Io { path: PathBuf, source: io::Error },
    /// `path` exists but does not hold the expected JSON
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// A value could not be encoded
    Encode(serde_json::Error),
    /// The data directory did not read back what was written
    ProbeMismatch(PathBuf),
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "storage_io",
            StorageError::Corrupt { .. } => "storage_corrupt",
            StorageError::Encode(_) => "storage_encode",
            StorageError::ProbeMismatch(_) => "storage_probe_mismatch",
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StorageError::Corrupt { path, source } => {
                write!(f, "{} is not valid JSON: {source}", path.display())
            }
            StorageError::Encode(e) => write!(f, "cannot encode value: {e}"),
            StorageError::ProbeMismatch(path) => {
                write!(f, "data directory {} failed the write probe", path.display())
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io { source, .. } => Some(source),
            StorageError::Corrupt { source, .. } => Some(source),
            StorageError::Encode(e) => Some(e),
            StorageError::ProbeMismatch(_) => None,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A data directory known to be writable.
///
/// Only [`JsonFileStore::open`] builds one, so every method can assume the
/// directory exists.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    paths: StoragePaths,
}

impl JsonFileStore {
    /// Create the data directory if needed and probe it with a
    /// write, read back and delete.
    pub fn open(paths: StoragePaths) -> StorageResult<Self> {
        let root = paths.root();
        fs::create_dir_all(root).map_err(|e| StorageError::io(root, e))?;

        let probe = paths.health_check_file();
        fs::write(&probe, PROBE_BYTES).map_err(|e| StorageError::io(&probe, e))?;
        let echoed = fs::read(&probe).map_err(|e| StorageError::io(&probe, e))?;
        fs::remove_file(&probe).map_err(|e| StorageError::io(&probe, e))?;
        if echoed != PROBE_BYTES {
            return Err(StorageError::ProbeMismatch(root.to_path_buf()));
        }

        debug!(root = %root.display(), "Data directory ready");
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Decode the document at `path`. A missing file is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<Option<T>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };
        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Replace the document at `path`.
    ///
    /// The value goes to a sibling temp file that is synced and then renamed
    /// over the target.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let encoded = serde_json::to_vec_pretty(value).map_err(StorageError::Encode)?;
        let staging = StoragePaths::staging_for(path);

        write_synced(&staging, &encoded).map_err(|e| StorageError::io(&staging, e))?;
        fs::rename(&staging, path).map_err(|e| StorageError::io(path, e))
    }

    /// Block until this process holds the data directory lock.
    ///
    /// The lock is advisory: it only excludes other holders of
    /// [`JsonFileStore::lock`] on the same directory, including other
    /// processes.
    pub fn lock(&self) -> StorageResult<DirectoryLock> {
        let path = self.paths.lock_file();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.lock().map_err(|e| StorageError::io(&path, e))?;
        Ok(DirectoryLock { file })
    }
}

/// Exclusive hold on a data directory. Released on drop.
#[derive(Debug)]
pub struct DirectoryLock {
    file: File,
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(error = %e, "Failed to release data directory lock");
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        count: u32,
    }

    fn store(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::open(StoragePaths::new(dir.path().join("nested/data"))).unwrap()
    }

    #[test]
    fn open_creates_directory_and_cleans_probe() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(store.paths().root().is_dir());
        assert!(!store.paths().health_check_file().exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = store.paths().preferences();
        let doc = Doc {
            name: "prefs".to_string(),
            count: 3,
        };

        store.save(&path, &doc).unwrap();

        assert_eq!(store.load::<Doc>(&path).unwrap(), Some(doc));
        assert!(!StoragePaths::staging_for(&path).exists());
    }

    #[test]
    fn save_replaces_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = store.paths().preferences();

        store.save(&path, &Doc { name: "a".to_string(), count: 1 }).unwrap();
        store.save(&path, &Doc { name: "b".to_string(), count: 2 }).unwrap();

        let loaded: Doc = store.load(&path).unwrap().unwrap();
        assert_eq!(loaded.name, "b");
    }

    #[test]
    fn missing_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert_eq!(store.load::<Doc>(&store.paths().preferences()).unwrap(), None);
    }

    #[test]
    fn lock_excludes_other_handles_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let held = store.lock().unwrap();
        let other = File::open(store.paths().lock_file()).unwrap();
        assert!(other.try_lock().is_err());

        drop(held);
        assert!(other.try_lock().is_ok());
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = store.paths().preferences();
        fs::write(&path, b"{\"name\": ").unwrap();

        let err = store.load::<Doc>(&path).unwrap_err();
        assert_eq!(err.error_code(), "storage_corrupt");
        assert!(err.to_string().contains("preferences.json"));
    }
}
