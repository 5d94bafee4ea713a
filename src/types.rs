//! Shared types for the GLEANER agent.
//!
//! These types form the data model used across all modules.
//! They are kept free of I/O so that platform, strategy, and engine
//! modules can depend on them without circular references.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A giveaway listed on a page of the listing site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Display name. Also the identity key across pages and cycles.
    pub name: String,
    /// Site-specific giveaway code used when submitting an entry.
    pub id: String,
    /// Entry cost in points.
    pub cost: u32,
    /// Opaque reference handed to the review source (a store URL).
    pub review_ref: String,
    /// Bundles and other items without an independently reviewable identity.
    pub is_aggregate: bool,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}P]", self.name, self.cost)
    }
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

/// Positive / total review counts for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total_positive: u64,
    pub total_reviews: u64,
}

impl ReviewSummary {
    /// No reviews at all. Scores as 0.
    pub const EMPTY: ReviewSummary = ReviewSummary {
        total_positive: 0,
        total_reviews: 0,
    };

    /// Policy sentinel for bundles (and removed store pages under the
    /// high-confidence fallback). Not a measurement.
    pub const AGGREGATE: ReviewSummary = ReviewSummary {
        total_positive: 2000,
        total_reviews: 2000,
    };

    /// Build a summary, clamping positives to the total.
    pub fn new(total_positive: u64, total_reviews: u64) -> Self {
        Self {
            total_positive: total_positive.min(total_reviews),
            total_reviews,
        }
    }

}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} positive", self.total_positive, self.total_reviews)
    }
}

/// What the review cache substitutes when a review lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ReviewFallback {
    /// Unreachable or invalid reviews count as zero reviews (never accepted).
    #[default]
    #[serde(rename = "treat-as-zero")]
    TreatAsZero,
    /// Unreachable store pages are assumed to be removed content and get the
    /// high-confidence sentinel.
    #[serde(rename = "treat-as-removed-high-confidence")]
    TreatAsRemoved,
}

impl ReviewFallback {
    pub fn summary(&self) -> ReviewSummary {
        match self {
            ReviewFallback::TreatAsZero => ReviewSummary::EMPTY,
            ReviewFallback::TreatAsRemoved => ReviewSummary::AGGREGATE,
        }
    }
}

/// A candidate paired with its resolved review summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Reviewed {
    pub candidate: Candidate,
    pub review: ReviewSummary,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Acceptance score attached by the entry filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Wilson lower bound of the positive-review ratio, in [0, 1].
    Computed(f64),
    /// Source is exempt from review filtering; always accepted.
    Exempt,
}

impl Score {
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Computed(v) => Some(*v),
            Score::Exempt => None,
        }
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self, Score::Exempt)
    }
}

/// A reviewed candidate with its acceptance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub review: ReviewSummary,
    pub score: Score,
}

impl ScoredCandidate {
    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn cost(&self) -> u32 {
        self.candidate.cost
    }
}

impl fmt::Display for ScoredCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Exempt candidates have no score worth showing.
        match self.score {
            Score::Computed(v) => write!(f, "{}({:.2})", self.candidate.name, v),
            Score::Exempt => write!(f, "{}", self.candidate.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing pages and sources
// ---------------------------------------------------------------------------

/// One ordered listing the crawler walks page by page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub name: String,
    /// Page URL; `{page}` is replaced by the page number, otherwise the
    /// number is appended.
    pub url_template: String,
    /// Whether ordinary items from this source are review-scored.
    pub apply_review_filter: bool,
}

impl Source {
    pub fn page_url(&self, page: u32) -> String {
        if self.url_template.contains("{page}") {
            self.url_template.replace("{page}", &page.to_string())
        } else {
            format!("{}{}", self.url_template, page)
        }
    }
}

/// A parsed listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub items: Vec<Candidate>,
    /// Items pinned above every page of every source.
    pub pinned_items: Vec<Candidate>,
    pub is_last_page: bool,
    /// Points left on the account, as shown on this page.
    pub points_remaining: u32,
}

// ---------------------------------------------------------------------------
// Entry responses
// ---------------------------------------------------------------------------

/// Validated response of an entry submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryResponse {
    /// Response carried a `type` (e.g. "success").
    Accepted { kind: String, points: Option<u32> },
    /// Response carried only a `msg`, e.g. "Previously Won".
    Refused { message: String },
    /// Body did not match the expected shape.
    Unparseable { reason: String },
}

#[derive(Debug, Deserialize)]
struct RawEntryResponse {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    points: Option<serde_json::Value>,
}

impl EntryResponse {
    /// Validate a raw response body.
    pub fn parse(body: &str) -> Self {
        let raw: RawEntryResponse = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                return EntryResponse::Unparseable {
                    reason: format!("invalid entry response: {e}"),
                }
            }
        };

        let points = raw.points.as_ref().and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        match (raw.msg, raw.kind) {
            (Some(message), _) if !message.is_empty() => EntryResponse::Refused { message },
            (_, Some(kind)) if !kind.is_empty() => EntryResponse::Accepted { kind, points },
            _ => EntryResponse::Unparseable {
                reason: "entry response has neither `type` nor `msg`".to_string(),
            },
        }
    }

    /// Human-readable text of the response (message, else type).
    pub fn text(&self) -> &str {
        match self {
            EntryResponse::Accepted { kind, .. } => kind,
            EntryResponse::Refused { message } => message,
            EntryResponse::Unparseable { reason } => reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Ignore set
// ---------------------------------------------------------------------------

/// Names that can never be entered again (e.g. previously won).
///
/// Lives for the process lifetime; nothing expires it.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the name was not already ignored.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GLEANER.
#[derive(Debug, thiserror::Error)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Confidence must be strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    #[error("Listing site error ({site}): {message}")]
    Site { site: String, message: String },

    #[error("Review source error ({source_name}): {message}")]
    Reviews { source_name: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
