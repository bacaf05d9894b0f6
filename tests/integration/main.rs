//! End-to-end tests: snapshot file to scan report and HTTP responses.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use time::macros::datetime;
use time::Duration;
use tower::ServiceExt;

use sports_arb::api::{create_router, AppState};
use sports_arb::arbitrage::{plan_stakes, scan, scan_parallel, ScanOptions};
use sports_arb::config::Config;
use sports_arb::market::Outcome;
use sports_arb::quotes::QuoteSnapshot;

fn feed() -> Value {
    json!([
        // Two-way sure bet: 2.10 / 2.10 across bookmakers.
        {"sport_title": "NBA", "home_team": "Lakers", "away_team": "Celtics",
         "bookmaker": "Bet365", "market_type": "h2h", "outcome_team": "Lakers", "price": 2.10},
        {"sport_title": "NBA", "home_team": "Lakers", "away_team": "Celtics",
         "bookmaker": "Unibet", "market_type": "h2h", "outcome_team": "Celtics", "price": 2.10},
        {"sport_title": "NBA", "home_team": "Lakers", "away_team": "Celtics",
         "bookmaker": "Unibet", "market_type": "h2h", "outcome_team": "Lakers", "price": 1.85},
        // Sub-1.0 price must not win the home outcome.
        {"sport_title": "NBA", "home_team": "Lakers", "away_team": "Celtics",
         "bookmaker": "Broken", "market_type": "h2h", "outcome_team": "Lakers", "price": 0.95},
        // Three-way with no edge.
        {"sport_title": "EPL", "home_team": "Arsenal", "away_team": "Chelsea",
         "bookmaker": "Bet365", "market_type": "h2h_3_way", "outcome_team": "Arsenal", "price": 2.5},
        {"sport_title": "EPL", "home_team": "Arsenal", "away_team": "Chelsea",
         "bookmaker": "Bet365", "market_type": "h2h_3_way", "outcome_team": "Draw", "price": 3.4},
        {"sport_title": "EPL", "home_team": "Arsenal", "away_team": "Chelsea",
         "bookmaker": "Bet365", "market_type": "h2h_3_way", "outcome_team": "Chelsea", "price": 3.0},
        // Three-way missing its draw.
        {"sport_title": "EPL", "home_team": "Spurs", "away_team": "Everton",
         "bookmaker": "Bet365", "market_type": "h2h_3_way", "outcome_team": "Spurs", "price": 4.0},
        {"sport_title": "EPL", "home_team": "Spurs", "away_team": "Everton",
         "bookmaker": "Unibet", "market_type": "h2h_3_way", "outcome_team": "Everton", "price": 4.0}
    ])
}

fn write_feed(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sports-arb-{}-{name}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_vec(&feed()).unwrap()).unwrap();
    path
}

fn load_feed(name: &str) -> QuoteSnapshot {
    let path = write_feed(name);
    let snapshot = tokio_test::block_on(QuoteSnapshot::load(&path)).unwrap();
    std::fs::remove_file(&path).ok();
    snapshot
}

#[test]
fn snapshot_scan_finds_only_the_sure_bet() {
    let snapshot = load_feed("scan");
    let (quotes, rejected) = snapshot.quotes();
    assert!(rejected.is_empty());

    let report = scan(quotes, &ScanOptions::default());

    assert_eq!(report.events_evaluated, 3);
    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.quotes_discarded, 1);

    let opp = &report.opportunities[0];
    assert_eq!(opp.home_team, "Lakers");
    assert_eq!(opp.profit_margin_display(), 5.0);
    let home = opp.stake(Outcome::Home).unwrap();
    assert_eq!(home.bookmaker, "Bet365");
    assert_eq!(home.price, 2.10);
    assert!((home.stake_proportion - 0.5).abs() < 1e-9);

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].home_team.as_deref(), Some("Spurs"));
    assert!(report.skipped[0].reason.contains("draw"));
}

#[test]
fn stake_plan_for_detected_opportunity() {
    let snapshot = load_feed("stake");
    let (quotes, _) = snapshot.quotes();
    let report = scan(quotes, &ScanOptions::default());

    let plan = plan_stakes(&report.opportunities[0], dec!(200)).unwrap();

    assert_eq!(plan.leg(Outcome::Home).unwrap().stake, dec!(100));
    assert_eq!(plan.leg(Outcome::Away).unwrap().stake, dec!(100));
    assert_eq!(plan.guaranteed_profit, dec!(10));
}

#[tokio::test]
async fn parallel_scan_matches_sequential_scan() {
    let snapshot = load_feed_async("parallel").await;
    let (quotes, _) = snapshot.quotes();
    let options = ScanOptions::default();

    let sequential = scan(quotes.clone(), &options);
    let parallel = scan_parallel(quotes, &options).await;

    assert_eq!(sequential.opportunities, parallel.opportunities);
    assert_eq!(sequential.skipped, parallel.skipped);
    assert_eq!(sequential.quotes_discarded, parallel.quotes_discarded);
}

async fn load_feed_async(name: &str) -> QuoteSnapshot {
    let path = write_feed(name);
    let snapshot = QuoteSnapshot::load(&path).await.unwrap();
    std::fs::remove_file(&path).ok();
    snapshot
}

#[test]
fn stale_quotes_break_the_opportunity() {
    let now = datetime!(2026-10-19 12:00 UTC);
    let mut records = load_feed("stale").records;
    for record in &mut records {
        record.observed_at = Some(now - Duration::minutes(1));
    }
    // Away side of the sure bet is ten minutes old.
    records[1].observed_at = Some(now - Duration::minutes(10));
    let snapshot = QuoteSnapshot::new(records, now);
    let (quotes, _) = snapshot.quotes();

    let options = ScanOptions {
        now,
        max_quote_age: Some(Duration::minutes(5)),
        min_profit_margin: 0.0,
    };
    let report = scan(quotes, &options);

    assert!(report.opportunities.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].home_team.as_deref(), Some("Lakers"));
}

#[tokio::test]
async fn http_check_arbitrage_serves_the_opportunity() {
    let state = AppState::new(Config::default());
    state.replace_snapshot(load_feed_async("http").await).await;
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/check-arbitrage?stake=100")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-skipped-events"], "1");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let opps = body.as_array().unwrap();
    assert_eq!(opps.len(), 1);
    assert_eq!(opps[0]["home_team"], "Lakers");
    assert_eq!(opps[0]["profitMargin"], 5.0);
    assert_eq!(opps[0]["betProportionHome"], 0.5);
    assert_eq!(opps[0]["stakes"]["home"], "50.00");
}

#[tokio::test]
async fn http_odds_before_any_snapshot_is_empty() {
    let app = create_router(AppState::new(Config::default()));

    let response = app
        .oneshot(Request::builder().uri("/odds").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!([]));
}
