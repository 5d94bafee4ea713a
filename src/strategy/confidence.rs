//! Wilson score lower bound.
//!
//! Ranks items by the lower end of a one-sided confidence interval on their
//! true positive-review ratio, so that a handful of glowing reviews never
//! outranks thousands of mostly positive ones.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::types::{GleanerError, ReviewSummary};

/// Precomputed Wilson lower-bound scorer for a fixed confidence level.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    z: f64,
}

impl ConfidenceScorer {
    /// Prepare a scorer. The z-score is computed once here and reused for
    /// every call to [`lower_bound`](Self::lower_bound).
    pub fn new(confidence: f64) -> Result<Self, GleanerError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(GleanerError::InvalidConfidence(confidence));
        }
        let normal =
            Normal::new(0.0, 1.0).map_err(|e| GleanerError::Config(e.to_string()))?;
        let z = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
        Ok(Self { z })
    }

    /// Lower bound of the Wilson score interval for `positive` out of `total`.
    ///
    /// Returns 0 when there are no trials. Always within [0, 1].
    pub fn lower_bound(&self, positive: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        let phat = positive.min(total) as f64 / n;
        let z2 = self.z * self.z;

        let centre = phat + z2 / (2.0 * n);
        let margin = self.z * ((phat * (1.0 - phat) + z2 / (4.0 * n)) / n).sqrt();
        let bound = (centre - margin) / (1.0 + z2 / n);

        bound.clamp(0.0, 1.0)
    }

    pub fn score(&self, review: &ReviewSummary) -> f64 {
        self.lower_bound(review.total_positive, review.total_reviews)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
