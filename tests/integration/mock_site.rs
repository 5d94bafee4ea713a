//! Mock collaborators for integration testing.
//!
//! Deterministic `ListingSite` and `ReviewSource` implementations. Pages,
//! entry responses and review summaries are fully controllable from test
//! code, and every call is recorded for assertions.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use gleaner::platforms::{ListingSite, ReviewSource};
use gleaner::types::{Candidate, EntryResponse, ListingPage, ReviewSummary, Source};

/// Build a candidate whose review reference is `ref:<name>`.
pub fn game(name: &str, cost: u32) -> Candidate {
    Candidate {
        name: name.to_string(),
        id: format!("{}-code", name.to_lowercase().replace(' ', "-")),
        cost,
        review_ref: format!("ref:{name}"),
        is_aggregate: false,
    }
}

pub fn bundle(name: &str, cost: u32) -> Candidate {
    Candidate {
        is_aggregate: true,
        ..game(name, cost)
    }
}

pub fn page(items: Vec<Candidate>, is_last_page: bool, points: u32) -> ListingPage {
    ListingPage {
        items,
        pinned_items: Vec::new(),
        is_last_page,
        points_remaining: points,
    }
}

// ---------------------------------------------------------------------------
// Listing site
// ---------------------------------------------------------------------------

/// A mock listing site.
///
/// Pages are keyed by `(source name, page number)`; a page that was never
/// registered, or was registered as failing, makes `fetch_page` fail.
/// Entries succeed unless a response was registered for the name.
#[derive(Default)]
pub struct MockSite {
    pages: Mutex<HashMap<(String, u32), Option<ListingPage>>>,
    responses: Mutex<HashMap<String, EntryResponse>>,
    fetched: Mutex<Vec<(String, u32)>>,
    submitted: Mutex<Vec<String>>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, source: &str, number: u32, page: ListingPage) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((source.to_string(), number), Some(page));
        self
    }

    pub fn with_failing_page(self, source: &str, number: u32) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((source.to_string(), number), None);
        self
    }

    pub fn with_response(self, name: &str, response: EntryResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(name.to_string(), response);
        self
    }

    /// Every `(source, page)` fetched so far, in order.
    pub fn fetched(&self) -> Vec<(String, u32)> {
        self.fetched.lock().unwrap().clone()
    }

    /// Names of every submitted entry, in completion order.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.fetched.lock().unwrap().clear();
        self.submitted.lock().unwrap().clear();
    }
}

#[async_trait]
impl ListingSite for MockSite {
    async fn fetch_page(&self, source: &Source, page: u32) -> Result<ListingPage> {
        self.fetched
            .lock()
            .unwrap()
            .push((source.name.clone(), page));

        match self.pages.lock().unwrap().get(&(source.name.clone(), page)) {
            Some(Some(listing)) => Ok(listing.clone()),
            Some(None) => Err(anyhow!("mock: connection refused")),
            None => Err(anyhow!("mock: no page {page} for {}", source.name)),
        }
    }

    async fn submit_entry(&self, candidate: &Candidate) -> Result<EntryResponse> {
        self.submitted.lock().unwrap().push(candidate.name.clone());

        let response = self.responses.lock().unwrap().get(&candidate.name).cloned();
        Ok(response.unwrap_or(EntryResponse::Accepted {
            kind: "success".to_string(),
            points: None,
        }))
    }

    fn name(&self) -> &str {
        "mock-site"
    }
}

// ---------------------------------------------------------------------------
// Review source
// ---------------------------------------------------------------------------

/// A mock review source keyed by `ref:<name>`. Unknown references fail.
#[derive(Default)]
pub struct MockReviews {
    summaries: HashMap<String, ReviewSummary>,
    lookups: Mutex<Vec<String>>,
}

impl MockReviews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, positive: u64, total: u64) -> Self {
        self.summaries
            .insert(format!("ref:{name}"), ReviewSummary::new(positive, total));
        self
    }

    /// Number of underlying fetches for `name`.
    pub fn lookups_for(&self, name: &str) -> usize {
        let reference = format!("ref:{name}");
        self.lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|r| **r == reference)
            .count()
    }

    pub fn total_lookups(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewSource for MockReviews {
    async fn fetch_reviews(&self, reference: &str) -> Result<ReviewSummary> {
        self.lookups.lock().unwrap().push(reference.to_string());
        self.summaries
            .get(reference)
            .copied()
            .ok_or_else(|| anyhow!("mock: store page not found for {reference}"))
    }

    fn name(&self) -> &str {
        "mock-reviews"
    }
}

/// A review source that takes `delay` per lookup and records the highest
/// number of lookups it saw in flight at once. Every game is well reviewed.
pub struct SlowReviews {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    lookups: AtomicUsize,
}

impl SlowReviews {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewSource for SlowReviews {
    async fn fetch_reviews(&self, _reference: &str) -> Result<ReviewSummary> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ReviewSummary::new(9000, 9100))
    }

    fn name(&self) -> &str {
        "slow-reviews"
    }
}
