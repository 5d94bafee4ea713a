//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (session id, xsrf token) are referenced by env-var name in the
//! config and resolved at startup via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::{GleanerError, ReviewFallback, Source};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub reviews: ReviewsConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Sleep between full crawl cycles.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Shared request limit for review lookups and entry submissions.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Dedicated limit for review lookups (overrides the shared pool).
    #[serde(default)]
    pub review_concurrency: Option<usize>,
    /// Dedicated limit for entry submissions (overrides the shared pool).
    #[serde(default)]
    pub entry_concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Minimum Wilson lower bound for a candidate to be entered.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Confidence level of the lower bound, in (0, 1).
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Whether pinned giveaways are review-scored.
    #[serde(default = "default_true")]
    pub pinned_review_filter: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            confidence: default_confidence(),
            pinned_review_filter: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewsConfig {
    #[serde(default)]
    pub fallback: ReviewFallback,
    /// Optional time-to-live of cached reviews.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default = "default_store_base_url")]
    pub store_base_url: String,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            fallback: ReviewFallback::default(),
            cache_ttl_secs: None,
            store_base_url: default_store_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub session_id_env: String,
    pub xsrf_token_env: String,
    /// Visited in order.
    pub sources: Vec<Source>,
}

/// Resolved credentials for the listing site.
#[derive(Debug, Clone)]
pub struct SiteCredentials {
    pub session_id: SecretString,
    pub xsrf_token: SecretString,
}

fn default_cycle_interval_secs() -> u64 {
    900
}

fn default_threshold() -> f64 {
    0.7
}

fn default_confidence() -> f64 {
    0.95
}

fn default_concurrency() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_store_base_url() -> String {
    "https://store.steampowered.com".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to load config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), GleanerError> {
        let s = &self.scoring;
        if !(s.confidence > 0.0 && s.confidence < 1.0) {
            return Err(GleanerError::InvalidConfidence(s.confidence));
        }
        if !(0.0..=1.0).contains(&s.threshold) {
            return Err(GleanerError::Config(format!(
                "scoring.threshold must be within [0, 1], got {}",
                s.threshold
            )));
        }
        let limits = [
            ("agent.concurrency", Some(self.agent.concurrency)),
            ("agent.review_concurrency", self.agent.review_concurrency),
            ("agent.entry_concurrency", self.agent.entry_concurrency),
        ];
        for (key, value) in limits {
            if value == Some(0) {
                return Err(GleanerError::Config(format!("{key} must be positive")));
            }
        }
        if self.site.sources.is_empty() {
            return Err(GleanerError::Config(
                "site.sources must list at least one source".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.agent.cycle_interval_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.reviews.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Resolve the site credentials from the environment.
    pub fn credentials(&self) -> Result<SiteCredentials> {
        Ok(SiteCredentials {
            session_id: SecretString::new(Self::resolve_env(&self.site.session_id_env)?),
            xsrf_token: SecretString::new(Self::resolve_env(&self.site.xsrf_token_env)?),
        })
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
