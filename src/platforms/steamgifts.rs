//! SteamGifts listing pages and entry submission.
//!
//! Listing pages are plain HTML; giveaways are read from their heading
//! blocks. Entries go through the site's ajax endpoint with the session
//! cookie and xsrf token of a logged-in account.
//!
//! Faded rows (already entered, or not enterable) are skipped by the
//! selectors themselves.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::COOKIE;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use super::ListingSite;
use crate::config::SiteCredentials;
use crate::types::{Candidate, EntryResponse, GleanerError, ListingPage, Source};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const PLATFORM_NAME: &str = "steamgifts";

const PINNED_HEADINGS: &str = "div.pinned-giveaways__inner-wrap > div > div:not(.is-faded) \
     > div.giveaway__summary > h2.giveaway__heading";

const LISTED_HEADINGS: &str = "div:not(.pinned-giveaways__inner-wrap) > div > div:not(.is-faded) \
     > div.giveaway__summary > h2.giveaway__heading";

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Compiled selectors and patterns for SteamGifts listing pages.
pub struct ListingParser {
    pinned: Selector,
    listed: Selector,
    name: Selector,
    thin: Selector,
    icon: Selector,
    points: Selector,
    code_re: Regex,
    cost_re: Regex,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector `{css}`: {e:?}"))
}

impl ListingParser {
    fn new() -> Result<Self> {
        Ok(Self {
            pinned: selector(PINNED_HEADINGS)?,
            listed: selector(LISTED_HEADINGS)?,
            name: selector(".giveaway__heading__name")?,
            thin: selector(".giveaway__heading__thin")?,
            icon: selector(".giveaway__icon")?,
            points: selector("span.nav__points")?,
            code_re: Regex::new(r"giveaway/([^/]+)/").context("Invalid code pattern")?,
            cost_re: Regex::new(r"(\d+)P").context("Invalid cost pattern")?,
        })
    }

    /// Parse page `page` of a listing.
    pub fn parse(&self, html: &str, page: u32) -> Result<ListingPage> {
        let document = Html::parse_document(html);

        let pinned_items = self.headings(&document, &self.pinned);
        let items = self.headings(&document, &self.listed);

        let next_page = selector(&format!(r#"[data-page-number="{}"]"#, page + 1))?;
        let is_last_page = document.select(&next_page).next().is_none();

        // No points counter means the session is not logged in.
        let points_text: String = document
            .select(&self.points)
            .next()
            .map(|el| el.text().collect())
            .ok_or_else(|| GleanerError::Site {
                site: PLATFORM_NAME.to_string(),
                message: "points counter missing (session expired?)".to_string(),
            })?;
        let points_remaining = points_text.trim().replace(',', "").parse().map_err(|_| {
            GleanerError::Site {
                site: PLATFORM_NAME.to_string(),
                message: format!("unreadable points counter: {points_text:?}"),
            }
        })?;

        Ok(ListingPage {
            items,
            pinned_items,
            is_last_page,
            points_remaining,
        })
    }

    fn headings(&self, document: &Html, sel: &Selector) -> Vec<Candidate> {
        document
            .select(sel)
            .filter_map(|heading| {
                let parsed = self.parse_heading(heading);
                if parsed.is_none() {
                    let text: String = heading.text().collect();
                    debug!(heading = %text.trim(), "Skipping unparseable giveaway heading");
                }
                parsed
            })
            .collect()
    }

    fn parse_heading(&self, heading: ElementRef<'_>) -> Option<Candidate> {
        let name_el = heading.select(&self.name).next()?;
        let name = name_el.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            return None;
        }

        let href = name_el.value().attr("href")?;
        let id = self.code_re.captures(href)?.get(1)?.as_str().to_string();

        let thin: String = heading.select(&self.thin).flat_map(|el| el.text()).collect();
        let cost = self.cost_re.captures(&thin)?.get(1)?.as_str().parse().ok()?;

        let review_ref = heading
            .select(&self.icon)
            .find_map(|el| el.value().attr("href"))?
            .to_string();
        let is_aggregate = review_ref.contains("/sub/") || review_ref.contains("/bundle/");

        Some(Candidate {
            name,
            id,
            cost,
            review_ref,
            is_aggregate,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// SteamGifts client.
pub struct SteamGiftsClient {
    http: Client,
    base_url: String,
    credentials: SiteCredentials,
    parser: ListingParser,
}

impl SteamGiftsClient {
    pub fn new(base_url: &str, credentials: SiteCredentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("GLEANER/0.1.0 (giveaway-agent)")
            .build()
            .context("Failed to build HTTP client for SteamGifts")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            parser: ListingParser::new()?,
        })
    }

    fn session_cookie(&self) -> String {
        format!("PHPSESSID={}", self.credentials.session_id.expose_secret())
    }
}

#[async_trait]
impl ListingSite for SteamGiftsClient {
    async fn fetch_page(&self, source: &Source, page: u32) -> Result<ListingPage> {
        let url = source.page_url(page);
        info!(source = %source.name, url = %url, "Visiting listing page");

        let resp = self
            .http
            .get(&url)
            .header(COOKIE, self.session_cookie())
            .send()
            .await
            .context("SteamGifts page request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("SteamGifts page error {}: {url}", resp.status());
        }

        let html = resp
            .text()
            .await
            .context("Failed to read SteamGifts page body")?;

        let listing = self
            .parser
            .parse(&html, page)
            .with_context(|| format!("Failed to parse listing page {url}"))?;

        debug!(
            items = listing.items.len(),
            pinned = listing.pinned_items.len(),
            last_page = listing.is_last_page,
            points = listing.points_remaining,
            "Listing page parsed"
        );

        Ok(listing)
    }

    async fn submit_entry(&self, candidate: &Candidate) -> Result<EntryResponse> {
        let form = [
            ("xsrf_token", self.credentials.xsrf_token.expose_secret().as_str()),
            ("do", "entry_insert"),
            ("code", candidate.id.as_str()),
        ];

        let resp = self
            .http
            .post(format!("{}/ajax.php", self.base_url))
            .header(COOKIE, self.session_cookie())
            .form(&form)
            .send()
            .await
            .context("SteamGifts entry request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("SteamGifts entry error {} for {}", resp.status(), candidate.id);
        }

        let body = resp
            .text()
            .await
            .context("Failed to read SteamGifts entry response")?;

        Ok(EntryResponse::parse(&body))
    }

    fn name(&self) -> &str {
        PLATFORM_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
