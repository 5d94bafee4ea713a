//! Acquisition loop: the page → review → filter → budget → submit cycle.
//!
//! One page is processed completely before the next is fetched. Within a
//! page, review lookups and entry submissions fan out under their limiters
//! and are awaited as a batch. A run ends when every source is exhausted,
//! when points run out, or when a page cannot be fetched; each of these
//! resets the crawl back to the first page of the first source.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::{AgentConfig, AppConfig};
use crate::engine::cursor::CrawlCursor;
use crate::engine::report::{CompletionReason, CycleReport, PageReport};
use crate::engine::reviews::ReviewCache;
use crate::engine::submitter::EntrySubmitter;
use crate::platforms::{ListingSite, ReviewSource};
use crate::strategy::{affordable, ConfidenceScorer, EntryFilter};
use crate::types::{Candidate, GleanerError, IgnoreSet, Reviewed, ScoredCandidate, Source};

// ---------------------------------------------------------------------------
// Limiters
// ---------------------------------------------------------------------------

/// Request limiters for review lookups and entry submissions.
///
/// Both share one pool unless a dedicated limit is configured.
#[derive(Debug, Clone)]
pub struct Limiters {
    pub reviews: Arc<Semaphore>,
    pub entries: Arc<Semaphore>,
}

impl Limiters {
    pub fn from_config(agent: &AgentConfig) -> Self {
        let shared = Arc::new(Semaphore::new(agent.concurrency));
        let pool = |limit: Option<usize>| match limit {
            Some(n) => Arc::new(Semaphore::new(n)),
            None => Arc::clone(&shared),
        };
        Self {
            reviews: pool(agent.review_concurrency),
            entries: pool(agent.entry_concurrency),
        }
    }
}

// ---------------------------------------------------------------------------
// Page outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Fetch the next page.
    Continue,
    /// The run is over; the cursor is back at the start.
    Complete(CompletionReason),
}

#[derive(Debug, Clone)]
pub struct PageResult {
    pub outcome: PageOutcome,
    /// Absent when no page was processed (exhausted cursor, fetch failure).
    pub report: Option<PageReport>,
}

impl PageResult {
    fn complete(reason: CompletionReason, report: Option<PageReport>) -> Self {
        Self {
            outcome: PageOutcome::Complete(reason),
            report,
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

pub struct AcquisitionLoop {
    site: Arc<dyn ListingSite>,
    sources: Vec<Source>,
    filter: EntryFilter,
    pinned_review_filter: bool,
    reviews: ReviewCache,
    review_limiter: Arc<Semaphore>,
    submitter: EntrySubmitter,
    cursor: CrawlCursor,
    ignored: IgnoreSet,
    cycles: u64,
}

impl AcquisitionLoop {
    pub fn new(
        site: Arc<dyn ListingSite>,
        review_source: Arc<dyn ReviewSource>,
        cfg: &AppConfig,
    ) -> Result<Self, GleanerError> {
        let scorer = ConfidenceScorer::new(cfg.scoring.confidence)?;
        let limiters = Limiters::from_config(&cfg.agent);

        Ok(Self {
            submitter: EntrySubmitter::new(Arc::clone(&site), limiters.entries),
            site,
            sources: cfg.site.sources.clone(),
            filter: EntryFilter::new(scorer, cfg.scoring.threshold),
            pinned_review_filter: cfg.scoring.pinned_review_filter,
            reviews: ReviewCache::new(review_source, cfg.reviews.fallback, cfg.cache_ttl()),
            review_limiter: limiters.reviews,
            cursor: CrawlCursor::new(cfg.site.sources.len()),
            ignored: IgnoreSet::new(),
            cycles: 0,
        })
    }

    pub fn cursor(&self) -> &CrawlCursor {
        &self.cursor
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignored
    }

    pub fn review_cache(&self) -> &ReviewCache {
        &self.reviews
    }

    /// Back to the first page of the first source with a cold review cache.
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.reviews.clear();
        debug!(sources = self.sources.len(), "Crawl reset");
    }

    /// Process one listing page.
    pub async fn run_page(&mut self) -> PageResult {
        let source = self
            .cursor
            .current()
            .and_then(|(index, _)| self.sources.get(index))
            .cloned();
        let (Some(source), Some(page_number)) = (source, self.cursor.next_page_number()) else {
            self.reset();
            return PageResult::complete(CompletionReason::SourcesExhausted, None);
        };

        self.reviews.evict_expired();

        let page = match self.site.fetch_page(&source, page_number).await {
            Ok(page) => page,
            Err(e) => {
                error!(
                    source = %source.name,
                    page = page_number,
                    error = %e,
                    "Failed to fetch listing page, aborting run"
                );
                self.reset();
                return PageResult::complete(CompletionReason::FetchFailed, None);
            }
        };

        let mut report = PageReport {
            source: source.name.clone(),
            page: page_number,
            listed: page.items.len(),
            pinned: page.pinned_items.len(),
            points_available: page.points_remaining,
            ..Default::default()
        };

        // Pinned first; one batch so both groups share the limiter.
        let pinned_count = page.pinned_items.len();
        let mut ordinary = self
            .resolve_reviews(page.pinned_items.into_iter().chain(page.items))
            .await;
        let pinned: Vec<Reviewed> = ordinary.drain(..pinned_count).collect();

        let pinned_accepted = if self.cursor.pinned_handled() {
            Vec::new()
        } else if self.pinned_review_filter {
            self.filter.apply(pinned).accepted
        } else {
            EntryFilter::exempt(pinned)
        };
        self.cursor.mark_pinned_handled();

        let ordinary_accepted = if source.apply_review_filter {
            self.filter.apply(ordinary).accepted
        } else {
            EntryFilter::exempt(ordinary)
        };

        let accepted: Vec<ScoredCandidate> =
            pinned_accepted.into_iter().chain(ordinary_accepted).collect();
        report.accepted = accepted.len();

        let (eligible, ignored): (Vec<_>, Vec<_>) = accepted
            .into_iter()
            .partition(|c| !self.ignored.contains(c.name()));
        for c in &ignored {
            debug!(name = %c.name(), "Skipping ignored giveaway");
        }
        report.ignored = ignored.len();

        let selected: Vec<ScoredCandidate> = affordable(&eligible, page.points_remaining)
            .cloned()
            .collect();
        report.selected = selected.len();

        let submission = self.submitter.submit_all(&selected).await;
        for name in submission.previously_won() {
            if self.ignored.insert(name) {
                info!(name = %name, "Previously won, ignoring from now on");
                report.newly_ignored.push(name.to_string());
            }
        }
        report.submission = submission;

        if report.budget_bound() {
            info!(
                points = page.points_remaining,
                eligible = eligible.len(),
                selected = report.selected,
                "Run out of points"
            );
            self.reset();
            return PageResult::complete(CompletionReason::BudgetExhausted, Some(report));
        }

        self.cursor.advance(page.is_last_page);
        debug!(position = %self.cursor.position(), "Cursor advanced");

        PageResult {
            outcome: PageOutcome::Continue,
            report: Some(report),
        }
    }

    async fn resolve_reviews(&self, candidates: impl Iterator<Item = Candidate>) -> Vec<Reviewed> {
        join_all(candidates.map(|candidate| async move {
            // The limiter is never closed; a missing permit only means unbounded.
            let _permit = self.review_limiter.acquire().await.ok();
            let review = self.reviews.get(&candidate).await;
            Reviewed { candidate, review }
        }))
        .await
    }

    /// Process pages until the run completes.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport::new(self.cycles);
        info!(cycle = self.cycles, "Starting cycle");

        loop {
            let step = self.run_page().await;
            if let Some(page) = &step.report {
                report.record(page);
            }
            if let PageOutcome::Complete(reason) = step.outcome {
                report.finish(reason);
                break;
            }
        }

        report.log();
        report
    }

    /// Run cycles forever, sleeping `interval` after each, until `shutdown`
    /// resolves. Returns the number of completed cycles.
    pub async fn run_until<F>(&mut self, interval: Duration, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;

        loop {
            tokio::select! {
                _ = self.run_cycle() => completed += 1,
                _ = &mut shutdown => {
                    info!("Shutdown signal received during cycle.");
                    break;
                }
            }

            info!(sleep_secs = interval.as_secs(), "Sleeping until next cycle");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }

        completed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
