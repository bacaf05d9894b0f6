//! Batch arbitrage scan over a quote snapshot.

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::calculator::ArbitrageOpportunity;
use super::detector::{check_event, EventCheck, EventFailure};
use crate::market::Quote;
use crate::metrics;
use crate::quotes::{group_by_event, retain_fresh, EventQuotes};

/// Parameters for one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Reference time for the freshness policy.
    pub now: OffsetDateTime,
    /// Maximum quote age; `None` disables the policy.
    pub max_quote_age: Option<Duration>,
    /// Minimum profit margin in percent (exclusive).
    pub min_profit_margin: f64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            now: OffsetDateTime::now_utc(),
            max_quote_age: None,
            min_profit_margin: 0.0,
        }
    }
}

/// Event excluded from the results.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SkippedEvent {
    /// Event identifier.
    pub event_id: String,
    /// Home team, if known.
    pub home_team: Option<String>,
    /// Away team, if known.
    pub away_team: Option<String>,
    /// Why the event was skipped.
    pub reason: String,
}

impl SkippedEvent {
    fn new(event: &EventQuotes, reason: String) -> Self {
        Self {
            event_id: event.event_id.clone(),
            home_team: event.home_team().map(str::to_string),
            away_team: event.away_team().map(str::to_string),
            reason,
        }
    }
}

/// Result of scanning a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Opportunities in first-seen event order.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Events that could not be evaluated.
    pub skipped: Vec<SkippedEvent>,
    /// Events evaluated (including skipped ones).
    pub events_evaluated: usize,
    /// Quotes dropped as stale or invalid.
    pub quotes_discarded: usize,
}

/// Skip reason plus quotes the normalizer rejected before giving up.
struct Skip {
    reason: String,
    discarded: usize,
}

impl ScanReport {
    fn record(&mut self, event: &EventQuotes, result: Result<EventCheck, Skip>) {
        self.events_evaluated += 1;
        metrics::inc_events_evaluated();

        match result {
            Ok(check) => {
                self.quotes_discarded += check.discarded;
                if let Some(opp) = check.opportunity {
                    metrics::inc_opportunities_detected();
                    self.opportunities.push(opp);
                }
            }
            Err(skip) => {
                self.quotes_discarded += skip.discarded;
                warn!(event_id = %event.event_id, reason = %skip.reason, "Event skipped");
                self.skipped.push(SkippedEvent::new(event, skip.reason));
            }
        }
    }
}

fn market_failure(failure: EventFailure) -> Skip {
    metrics::inc_events_skipped(failure.error.reason());
    Skip {
        reason: failure.error.to_string(),
        discarded: failure.discarded,
    }
}

fn prepare(quotes: Vec<Quote>, options: &ScanOptions) -> (Vec<EventQuotes>, usize) {
    let (fresh, stale) = retain_fresh(quotes, options.now, options.max_quote_age);
    if stale > 0 {
        metrics::inc_quotes_discarded_by("stale", stale as u64);
    }
    (group_by_event(fresh), stale)
}

/// Evaluate every event in the snapshot, sequentially.
///
/// Failures are isolated per event and reported in `skipped`.
#[instrument(skip_all, fields(quotes = quotes.len()))]
pub fn scan(quotes: Vec<Quote>, options: &ScanOptions) -> ScanReport {
    let _timer = metrics::timer_scan();
    let (events, stale) = prepare(quotes, options);

    let mut report = ScanReport {
        quotes_discarded: stale,
        ..ScanReport::default()
    };

    for event in &events {
        let result =
            check_event(&event.event_id, &event.quotes, options.min_profit_margin).map_err(market_failure);
        report.record(event, result);
    }

    log_summary(&report);
    report
}

/// Evaluate every event in the snapshot, one task per event.
///
/// Produces the same report as [`scan`]; a panicking task is recorded as a
/// skipped event.
#[instrument(skip_all, fields(quotes = quotes.len()))]
pub async fn scan_parallel(quotes: Vec<Quote>, options: &ScanOptions) -> ScanReport {
    let _timer = metrics::timer_scan();
    let (events, stale) = prepare(quotes, options);
    let min_profit_margin = options.min_profit_margin;

    let handles: Vec<_> = events
        .iter()
        .map(|event| {
            let event_id = event.event_id.clone();
            let quotes = event.quotes.clone();
            tokio::spawn(async move { check_event(&event_id, &quotes, min_profit_margin) })
        })
        .collect();

    let mut report = ScanReport {
        quotes_discarded: stale,
        ..ScanReport::default()
    };

    for (event, handle) in events.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result.map_err(market_failure),
            Err(e) => {
                metrics::inc_events_skipped("task_failed");
                Err(Skip {
                    reason: format!("evaluation task failed: {e}"),
                    discarded: 0,
                })
            }
        };
        report.record(event, result);
    }

    log_summary(&report);
    report
}

fn log_summary(report: &ScanReport) {
    info!(
        events = report.events_evaluated,
        opportunities = report.opportunities.len(),
        skipped = report.skipped.len(),
        quotes_discarded = report.quotes_discarded,
        "Arbitrage scan complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketType, Outcome};
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    fn quote(event: &str, bookmaker: &str, market: MarketType, outcome: Outcome, price: f64) -> Quote {
        Quote {
            event_id: event.to_string(),
            sport: "EPL".to_string(),
            home_team: format!("{event}-home"),
            away_team: format!("{event}-away"),
            bookmaker: bookmaker.to_string(),
            market_type: market,
            outcome,
            price,
            observed_at: None,
        }
    }

    fn snapshot() -> Vec<Quote> {
        vec![
            // Arbitrage across two books.
            quote("arb", "A", MarketType::TwoWay, Outcome::Home, 2.10),
            quote("arb", "B", MarketType::TwoWay, Outcome::Away, 2.10),
            // Three-way with overround.
            quote("fair", "A", MarketType::ThreeWay, Outcome::Home, 2.5),
            quote("fair", "A", MarketType::ThreeWay, Outcome::Draw, 3.4),
            quote("fair", "A", MarketType::ThreeWay, Outcome::Away, 3.0),
            // Three-way missing the draw.
            quote("nodraw", "A", MarketType::ThreeWay, Outcome::Home, 4.0),
            quote("nodraw", "B", MarketType::ThreeWay, Outcome::Away, 4.0),
            // Second arbitrage, three-way.
            quote("arb3", "A", MarketType::ThreeWay, Outcome::Home, 3.2),
            quote("arb3", "B", MarketType::ThreeWay, Outcome::Away, 3.6),
            quote("arb3", "C", MarketType::ThreeWay, Outcome::Draw, 3.9),
            quote("arb3", "D", MarketType::ThreeWay, Outcome::Draw, 0.95),
        ]
    }

    #[test]
    fn scan_isolates_incomplete_events() {
        let report = scan(snapshot(), &ScanOptions::default());

        let ids: Vec<&str> = report.opportunities.iter().map(|o| o.event_id.as_str()).collect();
        assert_eq!(ids, vec!["arb", "arb3"]);
        assert_eq!(report.events_evaluated, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].event_id, "nodraw");
        assert_eq!(report.skipped[0].home_team.as_deref(), Some("nodraw-home"));
        assert!(report.skipped[0].reason.contains("draw"));
        assert_eq!(report.quotes_discarded, 1);
    }

    #[test]
    fn scan_drops_stale_quotes_before_normalizing() {
        let now = datetime!(2026-10-19 12:00 UTC);
        let mut quotes = snapshot();
        quotes[1].observed_at = Some(datetime!(2026-10-19 11:00 UTC));

        let options = ScanOptions {
            now,
            max_quote_age: Some(Duration::minutes(10)),
            min_profit_margin: 0.0,
        };
        let report = scan(quotes, &options);

        assert!(report.opportunities.iter().all(|o| o.event_id != "arb"));
        assert!(report.skipped.iter().any(|s| s.event_id == "arb"));
        assert_eq!(report.quotes_discarded, 2);
    }

    #[test]
    fn skipped_event_still_reports_discarded_quotes() {
        let mut quotes = snapshot();
        quotes.push(quote("nodraw", "C", MarketType::ThreeWay, Outcome::Home, 1.0));

        let report = scan(quotes, &ScanOptions::default());

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.quotes_discarded, 2);
    }

    #[test]
    fn unbounded_max_age_keeps_all_quotes() {
        let mut quotes = snapshot();
        quotes[1].observed_at = Some(datetime!(2000-01-01 0:00 UTC));

        let options = ScanOptions {
            now: datetime!(2026-10-19 12:00 UTC),
            max_quote_age: crate::quotes::max_age_from_secs(u64::MAX),
            min_profit_margin: 0.0,
        };
        let report = scan(quotes, &options);

        let ids: Vec<&str> = report.opportunities.iter().map(|o| o.event_id.as_str()).collect();
        assert_eq!(ids, vec!["arb", "arb3"]);
        assert_eq!(report.quotes_discarded, 1);
    }

    #[test]
    fn scan_of_empty_snapshot_is_empty() {
        let report = scan(Vec::new(), &ScanOptions::default());
        assert_eq!(report.events_evaluated, 0);
        assert!(report.opportunities.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn parallel_scan_matches_sequential() {
        let options = ScanOptions::default();

        let sequential = scan(snapshot(), &options);
        let parallel = scan_parallel(snapshot(), &options).await;

        assert_eq!(parallel.opportunities, sequential.opportunities);
        assert_eq!(parallel.skipped, sequential.skipped);
        assert_eq!(parallel.events_evaluated, sequential.events_evaluated);
        assert_eq!(parallel.quotes_discarded, sequential.quotes_discarded);
    }
}
