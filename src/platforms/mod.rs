//! Platform integrations.
//!
//! Defines the collaborator traits the engine talks to and provides
//! implementations for:
//! - SteamGifts — listing pages (HTML) and entry submission
//! - Steam store — review summaries (JSON)

pub mod steam_store;
pub mod steamgifts;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Candidate, EntryResponse, ListingPage, ReviewSummary, Source};

/// Abstraction over giveaway listing sites.
///
/// Implementors fetch and parse listing pages and submit entries.
#[async_trait]
pub trait ListingSite: Send + Sync {
    /// Fetch page `page` (1-based) of `source`.
    async fn fetch_page(&self, source: &Source, page: u32) -> Result<ListingPage>;

    /// Submit one entry.
    ///
    /// `Err` means the request itself failed; a response that arrived but
    /// did not validate is `Ok(EntryResponse::Unparseable { .. })`.
    async fn submit_entry(&self, candidate: &Candidate) -> Result<EntryResponse>;

    /// Site name for logging and identification.
    fn name(&self) -> &str;
}

/// Abstraction over review providers.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch the review summary for an opaque candidate reference.
    async fn fetch_reviews(&self, reference: &str) -> Result<ReviewSummary>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}
