//! Entry submitter.
//!
//! Submits entries through the listing site with a bounded number in
//! flight and classifies every response. No failure aborts the batch; each
//! candidate gets exactly one attempt and one outcome.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::platforms::ListingSite;
use crate::types::{EntryResponse, ScoredCandidate};

/// Response text marking a giveaway the account can never enter again.
pub const PREVIOUSLY_WON_PATTERN: &str = "Previously Won";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Classified result of a single entry submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The site confirmed the entry.
    Entered,
    /// A valid response that is neither success nor a permanent rejection
    /// (e.g. "Not Enough Points", "Exists in Account").
    Informational(String),
    /// Permanent rejection; the name should be ignored from now on.
    PreviouslyWon(String),
    /// Transport failure, HTTP error or unparseable body. Ambiguous, so it
    /// never counts as a permanent rejection.
    Failed(String),
}

impl EntryOutcome {
    pub fn classify(response: &EntryResponse) -> Self {
        let text = response.text();
        match response {
            EntryResponse::Unparseable { reason } => EntryOutcome::Failed(reason.clone()),
            _ if text.contains(PREVIOUSLY_WON_PATTERN) => {
                EntryOutcome::PreviouslyWon(text.to_string())
            }
            EntryResponse::Accepted { kind, .. } if kind == "success" => EntryOutcome::Entered,
            _ => EntryOutcome::Informational(text.to_string()),
        }
    }

    /// Text logged next to the candidate.
    pub fn info(&self) -> &str {
        match self {
            EntryOutcome::Entered => "success",
            EntryOutcome::Informational(text)
            | EntryOutcome::PreviouslyWon(text)
            | EntryOutcome::Failed(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub name: String,
    pub cost: u32,
    pub outcome: EntryOutcome,
    /// Balance reported by the site after an accepted entry.
    pub points_left: Option<u32>,
}

/// Outcomes of one batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    pub results: Vec<SubmissionResult>,
}

impl SubmissionReport {
    pub fn entered(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Entered))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed(_)))
    }

    /// Points spent on confirmed entries.
    pub fn points_spent(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| r.outcome == EntryOutcome::Entered)
            .map(|r| r.cost)
            .sum()
    }

    /// Names rejected as previously won.
    pub fn previously_won(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, EntryOutcome::PreviouslyWon(_)))
            .map(|r| r.name.as_str())
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

pub struct EntrySubmitter {
    site: Arc<dyn ListingSite>,
    limiter: Arc<Semaphore>,
}

impl EntrySubmitter {
    pub fn new(site: Arc<dyn ListingSite>, limiter: Arc<Semaphore>) -> Self {
        Self { site, limiter }
    }

    /// Submit every candidate and wait for all of them to settle.
    pub async fn submit_all(&self, selected: &[ScoredCandidate]) -> SubmissionReport {
        if selected.is_empty() {
            return SubmissionReport::default();
        }

        info!(count = selected.len(), "Submitting entries");

        let results = join_all(selected.iter().map(|c| self.submit_one(c))).await;
        let report = SubmissionReport { results };

        info!(
            entered = report.entered(),
            failed = report.failed(),
            points_spent = report.points_spent(),
            "Entry batch complete"
        );

        report
    }

    async fn submit_one(&self, scored: &ScoredCandidate) -> SubmissionResult {
        let response = match self.limiter.acquire().await {
            Ok(_permit) => self
                .site
                .submit_entry(&scored.candidate)
                .await
                .map_err(|e| format!("{e:#}")),
            Err(e) => Err(format!("entry limiter closed: {e}")),
        };

        let (outcome, points_left) = match &response {
            Ok(response @ EntryResponse::Accepted { points, .. }) => {
                (EntryOutcome::classify(response), *points)
            }
            Ok(response) => (EntryOutcome::classify(response), None),
            Err(reason) => (EntryOutcome::Failed(reason.clone()), None),
        };

        match &outcome {
            EntryOutcome::Failed(reason) => {
                error!(giveaway = %scored.candidate.id, "{scored} - {reason}")
            }
            other => info!(
                giveaway = %scored.candidate.id,
                points_left = ?points_left,
                "{scored} - {}",
                other.info()
            ),
        }

        SubmissionResult {
            name: scored.candidate.name.clone(),
            cost: scored.candidate.cost,
            outcome,
            points_left,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
