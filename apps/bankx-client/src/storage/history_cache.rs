// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for transaction history first-page lookups.
//!
//! The history screen opens on page 0 every time, so that page is kept per
//! user for a short while instead of being refetched on each visit.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::models::TransactionHistoryPage;

/// Default lifetime of a cached first page.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    page: TransactionHistoryPage,
    page_size: u32,
    inserted_at: Instant,
}

/// In-process LRU cache of the first history page per user id.
pub struct HistoryCache {
    cache: Mutex<LruCache<i64, CacheEntry>>,
    ttl: Duration,
}

impl HistoryCache {
    /// Create a new cache with the given capacity (users) and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cached first page for `user_id` fetched with `page_size`.
    ///
    /// Returns `None` if not cached, expired, or cached with another size.
    pub fn get_first_page(&self, user_id: i64, page_size: u32) -> Option<TransactionHistoryPage> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.get(&user_id)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            cache.pop(&user_id);
            return None;
        }
        (entry.page_size == page_size).then(|| entry.page.clone())
    }

    /// Store the first page for `user_id`.
    pub fn put_first_page(&self, user_id: i64, page_size: u32, page: TransactionHistoryPage) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                user_id,
                CacheEntry {
                    page,
                    page_size,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the cached page for `user_id`.
    pub fn invalidate(&self, user_id: i64) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(&user_id);
        }
    }

    /// Drop every cached page (used on logout).
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(16, DEFAULT_HISTORY_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page(total: u64) -> TransactionHistoryPage {
        TransactionHistoryPage {
            size: 10,
            total_pages: 1,
            page: 0,
            content: Vec::new(),
            total_elements: total,
        }
    }

    #[test]
    fn cache_put_and_get() {
        let cache = HistoryCache::new(10, Duration::from_secs(300));
        assert!(cache.get_first_page(1, 10).is_none());

        cache.put_first_page(1, 10, sample_page(3));

        let page = cache.get_first_page(1, 10).unwrap();
        assert_eq!(page.total_elements, 3);
        assert!(cache.get_first_page(2, 10).is_none());
    }

    #[test]
    fn different_page_size_misses() {
        let cache = HistoryCache::new(10, Duration::from_secs(300));
        cache.put_first_page(1, 10, sample_page(3));
        assert!(cache.get_first_page(1, 20).is_none());
    }

    #[test]
    fn cache_invalidate() {
        let cache = HistoryCache::new(10, Duration::from_secs(300));
        cache.put_first_page(1, 10, sample_page(3));
        cache.invalidate(1);
        assert!(cache.get_first_page(1, 10).is_none());
    }

    #[test]
    fn cache_ttl_expiry() {
        let cache = HistoryCache::new(10, Duration::from_millis(1));
        cache.put_first_page(1, 10, sample_page(3));

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get_first_page(1, 10).is_none());
    }

    #[test]
    fn least_recently_used_user_is_evicted() {
        let cache = HistoryCache::new(1, Duration::from_secs(300));
        cache.put_first_page(1, 10, sample_page(1));
        cache.put_first_page(2, 10, sample_page(2));
        assert!(cache.get_first_page(1, 10).is_none());
        assert!(cache.get_first_page(2, 10).is_some());
    }
}
