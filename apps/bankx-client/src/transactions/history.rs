// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paginated transaction history.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::gateway::TransactionsApi;
use crate::models::TransactionHistoryPage;
use crate::pin::current_user_id;
use crate::storage::{HistoryCache, SessionStore};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub struct HistoryService<B> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    cache: Arc<HistoryCache>,
}

impl<B: TransactionsApi> HistoryService<B> {
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>, cache: Arc<HistoryCache>) -> Self {
        Self {
            backend,
            store,
            cache,
        }
    }

    /// One page of the logged-in user's history. Page 0 may come from cache.
    pub async fn history(&self, page: u32, size: u32) -> ClientResult<TransactionHistoryPage> {
        if size == 0 {
            return Err(ClientError::validation("Page size must be positive"));
        }
        let user_id = current_user_id(&self.store).await?;

        if page == 0 {
            if let Some(cached) = self.cache.get_first_page(user_id, size) {
                debug!(user_id, "History first page served from cache");
                return Ok(cached);
            }
        }

        let result = self
            .backend
            .transaction_history(user_id, page, size)
            .await?;

        if page == 0 {
            self.cache.put_first_page(user_id, size, result.clone());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{temp_store, FakeBackend};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn first_page_is_cached() {
        let (_dir, store) = temp_store().await;
        let backend = Arc::new(FakeBackend::default());
        let service = HistoryService::new(backend.clone(), store, Arc::new(HistoryCache::default()));

        service.history(0, DEFAULT_PAGE_SIZE).await.unwrap();
        service.history(0, DEFAULT_PAGE_SIZE).await.unwrap();
        assert_eq!(backend.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn later_pages_are_always_fetched() {
        let (_dir, store) = temp_store().await;
        let backend = Arc::new(FakeBackend::default());
        let service = HistoryService::new(backend.clone(), store, Arc::new(HistoryCache::default()));

        service.history(1, DEFAULT_PAGE_SIZE).await.unwrap();
        let page = service.history(1, DEFAULT_PAGE_SIZE).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(backend.history_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_page_size_is_invalid() {
        let (_dir, store) = temp_store().await;
        let service = HistoryService::new(
            Arc::new(FakeBackend::default()),
            store,
            Arc::new(HistoryCache::default()),
        );
        assert!(matches!(
            service.history(0, 0).await,
            Err(ClientError::Validation(_))
        ));
    }
}
