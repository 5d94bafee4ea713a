//! Review-score acceptance filter.
//!
//! Scores reviewed candidates with the Wilson lower bound and splits them
//! into accepted / rejected lists, keeping page order within each list.

use tracing::debug;

use super::confidence::ConfidenceScorer;
use crate::types::{Reviewed, Score, ScoredCandidate};

/// Result of filtering one batch of candidates.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<ScoredCandidate>,
    pub rejected: Vec<ScoredCandidate>,
}

impl FilterOutcome {
    pub fn len(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct EntryFilter {
    scorer: ConfidenceScorer,
    threshold: f64,
}

impl EntryFilter {
    pub fn new(scorer: ConfidenceScorer, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    /// Score every candidate and partition on `score >= threshold`.
    pub fn apply(&self, reviewed: Vec<Reviewed>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for Reviewed { candidate, review } in reviewed {
            let value = self.scorer.score(&review);
            let scored = ScoredCandidate {
                candidate,
                review,
                score: Score::Computed(value),
            };

            if value >= self.threshold {
                outcome.accepted.push(scored);
            } else {
                debug!(
                    name = %scored.candidate.name,
                    reviews = %scored.review,
                    score = format!("{value:.3}"),
                    threshold = self.threshold,
                    "Rejected by review score"
                );
                outcome.rejected.push(scored);
            }
        }

        outcome
    }

    /// Accept everything without scoring (sources exempt from filtering).
    pub fn exempt(reviewed: Vec<Reviewed>) -> Vec<ScoredCandidate> {
        reviewed
            .into_iter()
            .map(|Reviewed { candidate, review }| ScoredCandidate {
                candidate,
                review,
                score: Score::Exempt,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
