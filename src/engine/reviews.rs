//! Review cache with single-flight lookups.
//!
//! The cached value is the shared lookup future itself, inserted before it
//! is first awaited. A second lookup for the same name, in flight or
//! resolved, awaits that same future instead of issuing another request.
//! The whole table is dropped on every crawl reset; an optional TTL also
//! retires old entries between resets.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::platforms::ReviewSource;
use crate::types::{Candidate, ReviewFallback, ReviewSummary};

type SharedReview = Shared<BoxFuture<'static, ReviewSummary>>;

struct CacheEntry {
    review: SharedReview,
    inserted_at: DateTime<Utc>,
}

pub struct ReviewCache {
    source: Arc<dyn ReviewSource>,
    fallback: ReviewFallback,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ReviewCache {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        fallback: ReviewFallback,
        ttl: Option<std::time::Duration>,
    ) -> Self {
        Self {
            source,
            fallback,
            ttl: ttl.and_then(|t| Duration::from_std(t).ok()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned table only holds futures; keep using it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - entry.inserted_at < ttl,
            None => true,
        }
    }

    /// Review summary for a candidate. Never fails: lookup errors resolve
    /// to the configured fallback.
    pub async fn get(&self, candidate: &Candidate) -> ReviewSummary {
        // Bundles cannot be reviewed on their own.
        if candidate.is_aggregate {
            return ReviewSummary::AGGREGATE;
        }

        let review = {
            let now = Utc::now();
            let mut entries = self.entries();
            match entries.get(&candidate.name) {
                Some(entry) if self.is_fresh(entry, now) => {
                    debug!(name = %candidate.name, "Review cache hit");
                    entry.review.clone()
                }
                _ => {
                    let review = self.lookup(candidate);
                    entries.insert(
                        candidate.name.clone(),
                        CacheEntry {
                            review: review.clone(),
                            inserted_at: now,
                        },
                    );
                    review
                }
            }
        };

        review.await
    }

    fn lookup(&self, candidate: &Candidate) -> SharedReview {
        let source = Arc::clone(&self.source);
        let fallback = self.fallback;
        let name = candidate.name.clone();
        let reference = candidate.review_ref.clone();

        async move {
            match source.fetch_reviews(&reference).await {
                Ok(summary) => summary,
                Err(e) => {
                    let summary = fallback.summary();
                    warn!(
                        name = %name,
                        source = source.name(),
                        error = %e,
                        fallback = %summary,
                        "Review lookup failed, using fallback"
                    );
                    summary
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Review cache cleared");
    }

    /// Drop entries older than the TTL (no-op without a TTL).
    pub fn evict_expired(&self) {
        if self.ttl.is_none() {
            return;
        }
        let now = Utc::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "Expired reviews evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
