//! End-to-end acquisition scenarios against the mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use gleaner::config::AppConfig;
use gleaner::engine::acquisition::{AcquisitionLoop, PageOutcome};
use gleaner::engine::report::CompletionReason;
use gleaner::types::{EntryResponse, ListingPage};

use crate::mock_site::{bundle, game, page, MockReviews, MockSite, SlowReviews};

fn config(sources: &[(&str, bool)], extra: &str) -> AppConfig {
    let mut toml = format!(
        r#"
        [agent]
        name = "GLEANER-IT"
        cycle_interval_secs = 60

        [scoring]
        threshold = 0.7
        confidence = 0.95

        [site]
        base_url = "https://giveaways.test"
        session_id_env = "UNUSED"
        xsrf_token_env = "UNUSED"
        {extra}
        "#
    );
    for (name, filtered) in sources {
        toml.push_str(&format!(
            "\n[[site.sources]]\nname = \"{name}\"\nurl_template = \"https://giveaways.test/{name}?page=\"\napply_review_filter = {filtered}\n"
        ));
    }
    AppConfig::from_toml(&toml).unwrap()
}

fn agent(site: &Arc<MockSite>, reviews: &Arc<MockReviews>, cfg: &AppConfig) -> AcquisitionLoop {
    AcquisitionLoop::new(site.clone(), reviews.clone(), cfg).unwrap()
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unfiltered_source_enters_without_scoring() {
    let site = Arc::new(MockSite::new().with_page("wishlist", 1, page(vec![game("Portal", 10)], true, 50)));
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("wishlist", false)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let step = agent.run_page().await;
    let report = step.report.unwrap();

    assert_eq!(step.outcome, PageOutcome::Continue);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.selected, 1);
    assert_eq!(report.submission.entered(), 1);
    assert_eq!(site.submitted(), vec!["Portal"]);
}

#[tokio::test]
async fn single_positive_review_is_rejected() {
    let site = Arc::new(MockSite::new().with_page("all", 1, page(vec![game("Braid", 10)], true, 50)));
    let reviews = Arc::new(MockReviews::new().with("Braid", 1, 1));
    let cfg = config(&[("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let report = agent.run_page().await.report.unwrap();

    assert_eq!(report.listed, 1);
    assert_eq!(report.accepted, 0);
    assert!(site.submitted().is_empty());
}

#[tokio::test]
async fn budget_stops_at_first_unaffordable_and_resets() {
    let site = Arc::new(MockSite::new().with_page(
        "wishlist",
        1,
        page(vec![game("Expensive", 40), game("Cheap", 20)], false, 50),
    ));
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("wishlist", false)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let step = agent.run_page().await;

    assert_eq!(
        step.outcome,
        PageOutcome::Complete(CompletionReason::BudgetExhausted)
    );
    assert_eq!(site.submitted(), vec!["Expensive"]);
    assert_eq!(agent.cursor().current(), Some((0, 0)));
    assert!(!agent.cursor().pinned_handled());
    assert!(agent.review_cache().is_empty());
    // page 2 was never requested
    assert_eq!(site.fetched(), vec![("wishlist".to_string(), 1)]);
}

#[tokio::test]
async fn previously_won_is_ignored_in_later_cycles() {
    let site = Arc::new(
        MockSite::new()
            .with_page("all", 1, page(vec![game("Portal", 10), game("Braid", 5)], true, 100))
            .with_response(
                "Braid",
                EntryResponse::Refused {
                    message: "Previously Won".to_string(),
                },
            ),
    );
    let reviews = Arc::new(MockReviews::new().with("Portal", 9000, 9100).with("Braid", 5000, 5010));
    let cfg = config(&[("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let first = agent.run_cycle().await;
    assert_eq!(sorted(site.submitted()), vec!["Braid", "Portal"]);
    assert_eq!(first.newly_ignored, vec!["Braid".to_string()]);
    assert!(agent.ignored().contains("Braid"));

    site.clear_log();
    let second = agent.run_cycle().await;
    assert_eq!(site.submitted(), vec!["Portal"]);
    assert!(second.newly_ignored.is_empty());
}

#[tokio::test]
async fn failed_entries_are_not_ignored() {
    let site = Arc::new(
        MockSite::new()
            .with_page("all", 1, page(vec![game("Limbo", 10)], true, 100))
            .with_response(
                "Limbo",
                EntryResponse::Unparseable {
                    reason: "Previously Won? unclear".to_string(),
                },
            ),
    );
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("all", false)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let report = agent.run_cycle().await;

    assert_eq!(report.failed, 1);
    assert!(agent.ignored().is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_without_submissions() {
    let site = Arc::new(MockSite::new().with_failing_page("all", 1));
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let report = agent.run_cycle().await;

    assert_eq!(report.reason, CompletionReason::FetchFailed);
    assert_eq!(report.pages_visited, 0);
    assert!(site.submitted().is_empty());
    assert_eq!(agent.cursor().current(), Some((0, 0)));
}

#[tokio::test]
async fn fetch_failure_mid_source_restarts_from_first_page() {
    let site = Arc::new(
        MockSite::new()
            .with_page("all", 1, page(vec![game("Portal", 10)], false, 100))
            .with_failing_page("all", 2),
    );
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("all", false)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let report = agent.run_cycle().await;
    assert_eq!(report.reason, CompletionReason::FetchFailed);
    assert_eq!(report.pages_visited, 1);

    site.clear_log();
    agent.run_page().await;
    assert_eq!(site.fetched(), vec![("all".to_string(), 1)]);
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sources_are_walked_in_order() {
    let site = Arc::new(
        MockSite::new()
            .with_page("wishlist", 1, page(vec![], false, 100))
            .with_page("wishlist", 2, page(vec![], true, 100))
            .with_page("all", 1, page(vec![], true, 100)),
    );
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("wishlist", false), ("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    let report = agent.run_cycle().await;

    assert_eq!(report.reason, CompletionReason::SourcesExhausted);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(
        site.fetched(),
        vec![
            ("wishlist".to_string(), 1),
            ("wishlist".to_string(), 2),
            ("all".to_string(), 1),
        ]
    );
    assert_eq!(agent.cursor().current(), Some((0, 0)));
}

fn with_pinned(mut listing: ListingPage, pinned: Vec<gleaner::types::Candidate>) -> ListingPage {
    listing.pinned_items = pinned;
    listing
}

#[tokio::test]
async fn pinned_items_are_entered_once_per_traversal() {
    let site = Arc::new(
        MockSite::new()
            .with_page(
                "all",
                1,
                with_pinned(page(vec![game("Fez", 5)], false, 100), vec![game("Gem", 10)]),
            )
            .with_page(
                "all",
                2,
                with_pinned(page(vec![game("Limbo", 5)], true, 100), vec![game("Gem", 10)]),
            ),
    );
    let reviews = Arc::new(MockReviews::new().with("Gem", 4000, 4100));
    let cfg = config(&[("all", false)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    agent.run_cycle().await;
    assert_eq!(site.submitted(), vec!["Gem", "Fez", "Limbo"]);

    site.clear_log();
    agent.run_cycle().await;
    assert_eq!(site.submitted(), vec!["Gem", "Fez", "Limbo"]);
}

#[tokio::test]
async fn pinned_items_are_scored_unless_exempt() {
    let listing = with_pinned(page(vec![], true, 100), vec![game("Unknown", 10)]);
    let reviews = Arc::new(MockReviews::new());

    let site = Arc::new(MockSite::new().with_page("all", 1, listing.clone()));
    let mut scored = agent(&site, &reviews, &config(&[("all", false)], ""));
    scored.run_page().await;
    assert!(site.submitted().is_empty());

    let site = Arc::new(MockSite::new().with_page("all", 1, listing));
    let mut cfg = config(&[("all", false)], "");
    cfg.scoring.pinned_review_filter = false;
    let mut exempt = agent(&site, &reviews, &cfg);
    exempt.run_page().await;
    assert_eq!(site.submitted(), vec!["Unknown"]);
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reviews_cached_within_traversal_and_cleared_on_reset() {
    let site = Arc::new(
        MockSite::new()
            .with_page(
                "all",
                1,
                with_pinned(page(vec![game("Portal", 10)], false, 100), vec![game("Portal", 10)]),
            )
            .with_page("all", 2, page(vec![game("Portal", 10)], true, 100)),
    );
    let reviews = Arc::new(MockReviews::new().with("Portal", 9000, 9100));
    let cfg = config(&[("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    agent.run_cycle().await;
    assert_eq!(reviews.lookups_for("Portal"), 1);

    agent.run_cycle().await;
    assert_eq!(reviews.lookups_for("Portal"), 2);
}

#[tokio::test]
async fn bundles_pass_filter_without_lookup() {
    let site = Arc::new(MockSite::new().with_page("all", 1, page(vec![bundle("Complete Pack", 30)], true, 100)));
    let reviews = Arc::new(MockReviews::new());
    let cfg = config(&[("all", true)], "");
    let mut agent = agent(&site, &reviews, &cfg);

    agent.run_page().await;

    assert_eq!(site.submitted(), vec!["Complete Pack"]);
    assert_eq!(reviews.total_lookups(), 0);
}

#[tokio::test]
async fn removed_content_fallback_accepts_unreachable_reviews() {
    let listing = page(vec![game("Delisted", 10)], true, 100);
    let reviews = Arc::new(MockReviews::new());

    let site = Arc::new(MockSite::new().with_page("all", 1, listing.clone()));
    let mut zero = agent(&site, &reviews, &config(&[("all", true)], ""));
    zero.run_page().await;
    assert!(site.submitted().is_empty());

    let site = Arc::new(MockSite::new().with_page("all", 1, listing));
    let cfg = config(
        &[("all", true)],
        "[reviews]\nfallback = \"treat-as-removed-high-confidence\"",
    );
    let mut removed = agent(&site, &reviews, &cfg);
    removed.run_page().await;
    assert_eq!(site.submitted(), vec!["Delisted"]);
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

fn nine_games() -> Vec<gleaner::types::Candidate> {
    (1..=9).map(|i| game(&format!("Game {i}"), 1)).collect()
}

#[tokio::test(start_paused = true)]
async fn review_lookups_respect_dedicated_limit() {
    let site = Arc::new(MockSite::new().with_page("all", 1, page(nine_games(), true, 100)));
    let reviews = Arc::new(SlowReviews::new(Duration::from_millis(200)));
    let mut cfg = config(&[("all", true)], "");
    cfg.agent.review_concurrency = Some(2);
    let mut agent = AcquisitionLoop::new(site.clone(), reviews.clone(), &cfg).unwrap();

    let report = agent.run_page().await.report.unwrap();

    assert_eq!(reviews.total_lookups(), 9);
    assert_eq!(reviews.peak(), 2);
    assert_eq!(report.accepted, 9);
    assert_eq!(site.submitted().len(), 9);
}

#[tokio::test(start_paused = true)]
async fn review_lookups_share_the_common_pool_by_default() {
    let site = Arc::new(MockSite::new().with_page("all", 1, page(nine_games(), true, 100)));
    let reviews = Arc::new(SlowReviews::new(Duration::from_millis(200)));
    let mut cfg = config(&[("all", true)], "");
    cfg.agent.concurrency = 3;
    let mut agent = AcquisitionLoop::new(site.clone(), reviews.clone(), &cfg).unwrap();

    agent.run_page().await;

    assert_eq!(reviews.total_lookups(), 9);
    assert_eq!(reviews.peak(), 3);
}
