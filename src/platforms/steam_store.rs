//! Steam store review summaries.
//!
//! API: `GET {base}/appreviews/{app_id}?json=1&num_per_page=0&...`
//! Only the `query_summary` totals are used; individual reviews are never
//! requested. Bundles (`/sub/`) have no review endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::ReviewSource;
use crate::types::{GleanerError, ReviewSummary};

const SOURCE_NAME: &str = "steam-store";

const REVIEW_QUERY: &str = "json=1&num_per_page=0&purchase_type=all&cursor=*&language=all";

// ---------------------------------------------------------------------------
// API response types (Steam JSON → Rust)
// ---------------------------------------------------------------------------

/// The part of `/appreviews` we rely on. Missing totals fail validation.
#[derive(Debug, Deserialize)]
struct AppReviewResponse {
    query_summary: QuerySummary,
}

#[derive(Debug, Deserialize)]
struct QuerySummary {
    total_positive: u64,
    total_reviews: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SteamStoreClient {
    http: Client,
    base_url: String,
    app_re: Regex,
}

impl SteamStoreClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("GLEANER/0.1.0 (giveaway-agent)")
            .build()
            .context("Failed to build HTTP client for Steam store")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_re: Regex::new(r"/app/(\d+)").context("Invalid app id pattern")?,
        })
    }

    /// Review endpoint for a store page URL.
    pub fn review_url(&self, reference: &str) -> Result<String, GleanerError> {
        let app_id = self
            .app_re
            .captures(reference)
            .and_then(|c| c.get(1))
            .ok_or_else(|| GleanerError::Reviews {
                source_name: SOURCE_NAME.to_string(),
                message: format!("not a reviewable store page: {reference}"),
            })?;
        Ok(format!(
            "{}/appreviews/{}?{REVIEW_QUERY}",
            self.base_url,
            app_id.as_str()
        ))
    }
}

#[async_trait]
impl ReviewSource for SteamStoreClient {
    async fn fetch_reviews(&self, reference: &str) -> Result<ReviewSummary> {
        let url = self.review_url(reference)?;
        debug!(url = %url, "Fetching review summary");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Steam review request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Steam review error {}: {url}", resp.status());
        }

        let body: AppReviewResponse = resp
            .json()
            .await
            .context("Failed to parse Steam review summary")?;

        Ok(ReviewSummary::new(
            body.query_summary.total_positive,
            body.query_summary.total_reviews,
        ))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
