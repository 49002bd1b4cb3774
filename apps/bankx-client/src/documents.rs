// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! KYC document upload.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::{DocumentsApi, StatusApi};
use crate::models::DocumentFile;
use crate::status_sync::{StatusSynchronizer, SyncReport};
use crate::storage::SessionStore;
use crate::verification::{Transition, UserVerificationState};

/// Result of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Verification state after the follow-up status check
    pub state: UserVerificationState,
    /// `None` if the follow-up check could not be persisted
    pub sync: Option<SyncReport>,
}

pub struct DocumentService<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    sync: Arc<StatusSynchronizer<B>>,
}

impl<B: DocumentsApi + StatusApi> DocumentService<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, sync: Arc<StatusSynchronizer<B>>) -> Self {
        Self {
            backend,
            store,
            sync,
        }
    }

    /// Upload the ID and KRA images.
    ///
    /// On success the user moves to `UNVERIFIED` right away, then the
    /// status is checked against the backend.
    pub async fn upload(&self, id: &DocumentFile, kra: &DocumentFile) -> ClientResult<UploadOutcome> {
        for file in [id, kra] {
            if !file.is_image() {
                return Err(ClientError::validation(format!(
                    "{} is not an image (jpg, jpeg, png or gif)",
                    file.file_name
                )));
            }
            if file.bytes.is_empty() {
                return Err(ClientError::validation(format!("{} is empty", file.file_name)));
            }
        }

        self.backend.upload_documents(id, kra).await?;
        info!("KYC documents uploaded");

        self.store.save_documents_uploaded(true).await?;
        self.store
            .apply_transition(Transition::DocumentsUploaded)
            .await?;

        let sync = match self.sync.refresh().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Status refresh after upload failed");
                None
            }
        };

        Ok(UploadOutcome {
            state: self.store.user_state().await,
            sync,
        })
    }
}
