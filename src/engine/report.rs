//! Page and cycle reports.
//!
//! The acquisition loop produces one `PageReport` per listing page and folds
//! them into a `CycleReport` for the whole run.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

use crate::engine::submitter::SubmissionReport;

/// Why a crawl run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every source was walked to its last page.
    SourcesExhausted,
    /// Points ran out before every accepted candidate could be entered.
    BudgetExhausted,
    /// A listing page could not be fetched.
    FetchFailed,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompletionReason::SourcesExhausted => "sources exhausted",
            CompletionReason::BudgetExhausted => "out of points",
            CompletionReason::FetchFailed => "page fetch failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Page report
// ---------------------------------------------------------------------------

/// What happened on one listing page.
#[derive(Debug, Clone, Default)]
pub struct PageReport {
    pub source: String,
    /// 1-based page number as fetched.
    pub page: u32,
    pub listed: usize,
    pub pinned: usize,
    /// Accepted by review filtering (or exempt), before ignore and budget.
    pub accepted: usize,
    /// Accepted candidates dropped because their name is ignored.
    pub ignored: usize,
    /// Candidates the budget allowed.
    pub selected: usize,
    pub points_available: u32,
    pub submission: SubmissionReport,
    /// Names added to the ignore set by this page's submissions.
    pub newly_ignored: Vec<String>,
}

impl PageReport {
    /// True when the budget cut the accepted list short.
    pub fn budget_bound(&self) -> bool {
        self.accepted - self.ignored > self.selected
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of one full crawl run, from the first page until completion.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub pages_visited: usize,
    pub submitted: usize,
    pub entered: usize,
    pub failed: usize,
    pub points_spent: u32,
    pub newly_ignored: Vec<String>,
    pub reason: CompletionReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn new(cycle_number: u64) -> Self {
        let now = Utc::now();
        Self {
            cycle_number,
            pages_visited: 0,
            submitted: 0,
            entered: 0,
            failed: 0,
            points_spent: 0,
            newly_ignored: Vec::new(),
            reason: CompletionReason::SourcesExhausted,
            started_at: now,
            finished_at: now,
        }
    }

    /// Fold one page into the totals.
    pub fn record(&mut self, page: &PageReport) {
        self.pages_visited += 1;
        self.submitted += page.submission.results.len();
        self.entered += page.submission.entered();
        self.failed += page.submission.failed();
        self.points_spent += page.submission.points_spent();
        self.newly_ignored.extend(page.newly_ignored.iter().cloned());
    }

    pub fn finish(&mut self, reason: CompletionReason) {
        self.reason = reason;
        self.finished_at = Utc::now();
    }

    pub fn log(&self) {
        info!(
            cycle = self.cycle_number,
            pages = self.pages_visited,
            submitted = self.submitted,
            entered = self.entered,
            failed = self.failed,
            points_spent = self.points_spent,
            newly_ignored = self.newly_ignored.len(),
            reason = %self.reason,
            elapsed_secs = (self.finished_at - self.started_at).num_seconds(),
            "Cycle complete"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
