//! Arbitrage detection for a single event.

use tracing::{debug, info, instrument};

use super::calculator::{arbitrage_percentage, calculate_opportunity, ArbitrageOpportunity};
use crate::error::MarketError;
use crate::market::Quote;
use crate::quotes::{BestPriceSet, PriceBoard};

/// Outcome of evaluating one event.
#[derive(Debug, Clone)]
pub struct EventCheck {
    /// Opportunity, if one clears the margin threshold.
    pub opportunity: Option<ArbitrageOpportunity>,
    /// Quotes rejected by the normalizer.
    pub discarded: usize,
}

/// Event that could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFailure {
    /// Why the best-price set could not be built.
    pub error: MarketError,
    /// Quotes rejected by the normalizer before the failure.
    pub discarded: usize,
}

impl From<MarketError> for EventFailure {
    fn from(error: MarketError) -> Self {
        Self {
            error,
            discarded: 0,
        }
    }
}

/// Normalize one event's quotes and evaluate them.
///
/// `min_profit_margin` is in percent; an opportunity must exceed it strictly.
#[instrument(skip(quotes))]
pub fn check_event(
    event_id: &str,
    quotes: &[Quote],
    min_profit_margin: f64,
) -> Result<EventCheck, EventFailure> {
    let board = PriceBoard::collect(quotes).ok_or_else(|| MarketError::NoQuotes {
        event_id: event_id.to_string(),
    })?;
    let discarded = board.discarded().len();
    let prices = board
        .finish()
        .map_err(|error| EventFailure { error, discarded })?;

    let opportunity = check_arbitrage(&prices, min_profit_margin);
    Ok(EventCheck {
        opportunity,
        discarded,
    })
}

/// Evaluate a best-price set against the margin threshold.
pub fn check_arbitrage(prices: &BestPriceSet, min_profit_margin: f64) -> Option<ArbitrageOpportunity> {
    match calculate_opportunity(prices) {
        Some(opp) if opp.profit_margin > min_profit_margin => {
            info!(
                home_team = %opp.home_team,
                away_team = %opp.away_team,
                arbitrage_percentage = opp.arbitrage_percentage,
                profit_margin = opp.profit_margin,
                "Arbitrage opportunity detected"
            );
            Some(opp)
        }
        Some(opp) => {
            debug!(
                profit_margin = opp.profit_margin,
                threshold = min_profit_margin,
                "Opportunity below margin threshold"
            );
            None
        }
        None => {
            debug!(diagnosis = %diagnose_no_opportunity(prices), "No arbitrage opportunity");
            None
        }
    }
}

/// Get diagnostic information about why there's no opportunity.
pub fn diagnose_no_opportunity(prices: &BestPriceSet) -> NoOpportunityDiagnosis {
    let arbitrage_percentage = arbitrage_percentage(prices);
    NoOpportunityDiagnosis {
        legs: prices
            .iter()
            .map(|p| format!("{}@{}={}", p.outcome, p.bookmaker, p.price))
            .collect(),
        arbitrage_percentage,
        overround_pct: (arbitrage_percentage - 1.0) * 100.0,
    }
}

/// Diagnostic information for debugging.
#[derive(Debug, Clone)]
pub struct NoOpportunityDiagnosis {
    /// Best price per outcome, as `outcome@bookmaker=price`.
    pub legs: Vec<String>,
    /// Sum of implied probabilities.
    pub arbitrage_percentage: f64,
    /// How far the book is above 100%, in percent.
    pub overround_pct: f64,
}

impl std::fmt::Display for NoOpportunityDiagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | A={:.4} | overround={:.2}%",
            self.legs.join(", "),
            self.arbitrage_percentage,
            self.overround_pct,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketType, Outcome};

    fn quote(bookmaker: &str, market: MarketType, outcome: Outcome, price: f64) -> Quote {
        Quote {
            event_id: "evt".to_string(),
            sport: "EPL".to_string(),
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            bookmaker: bookmaker.to_string(),
            market_type: market,
            outcome,
            price,
            observed_at: None,
        }
    }

    #[test]
    fn check_event_finds_cross_book_opportunity() {
        let quotes = vec![
            quote("A", MarketType::TwoWay, Outcome::Home, 2.10),
            quote("A", MarketType::TwoWay, Outcome::Away, 1.70),
            quote("B", MarketType::TwoWay, Outcome::Home, 1.65),
            quote("B", MarketType::TwoWay, Outcome::Away, 2.10),
        ];

        let check = check_event("evt", &quotes, 0.0).unwrap();
        let opp = check.opportunity.expect("opportunity");

        assert_eq!(opp.stake(Outcome::Home).unwrap().bookmaker, "A");
        assert_eq!(opp.stake(Outcome::Away).unwrap().bookmaker, "B");
        assert_eq!(check.discarded, 0);
    }

    #[test]
    fn check_event_applies_margin_threshold() {
        let quotes = vec![
            quote("A", MarketType::TwoWay, Outcome::Home, 2.10),
            quote("B", MarketType::TwoWay, Outcome::Away, 2.10),
        ];

        assert!(check_event("evt", &quotes, 4.99).unwrap().opportunity.is_some());
        assert!(check_event("evt", &quotes, 5.01).unwrap().opportunity.is_none());
    }

    #[test]
    fn check_event_counts_discarded_quotes() {
        let quotes = vec![
            quote("Bad", MarketType::TwoWay, Outcome::Home, 0.95),
            quote("A", MarketType::TwoWay, Outcome::Home, 2.10),
            quote("B", MarketType::TwoWay, Outcome::Away, 2.10),
        ];

        let check = check_event("evt", &quotes, 0.0).unwrap();
        assert_eq!(check.discarded, 1);
        assert!(check.opportunity.is_some());
    }

    #[test]
    fn check_event_propagates_incomplete_market() {
        let quotes = vec![
            quote("A", MarketType::ThreeWay, Outcome::Home, 2.5),
            quote("A", MarketType::ThreeWay, Outcome::Away, 3.0),
        ];

        assert!(matches!(
            check_event("evt", &quotes, 0.0),
            Err(EventFailure {
                error: MarketError::IncompleteMarket { missing: Outcome::Draw, .. },
                discarded: 0,
            })
        ));
    }

    #[test]
    fn failed_event_keeps_discarded_count() {
        let quotes = vec![
            quote("Bad", MarketType::ThreeWay, Outcome::Draw, 0.95),
            quote("A", MarketType::ThreeWay, Outcome::Home, 2.5),
            quote("B", MarketType::ThreeWay, Outcome::Away, 3.0),
        ];

        let failure = check_event("evt", &quotes, 0.0).unwrap_err();

        assert_eq!(failure.discarded, 1);
        assert!(matches!(
            failure.error,
            MarketError::IncompleteMarket { missing: Outcome::Draw, .. }
        ));
    }

    #[test]
    fn check_event_rejects_empty_event() {
        assert_eq!(
            check_event("evt", &[], 0.0).unwrap_err().error,
            MarketError::NoQuotes {
                event_id: "evt".to_string()
            }
        );
    }

    #[test]
    fn diagnosis_reports_overround() {
        let quotes = vec![
            quote("A", MarketType::ThreeWay, Outcome::Home, 2.5),
            quote("B", MarketType::ThreeWay, Outcome::Away, 3.0),
            quote("C", MarketType::ThreeWay, Outcome::Draw, 3.4),
        ];
        let prices = crate::quotes::best_prices("evt", &quotes).unwrap();

        let diagnosis = diagnose_no_opportunity(&prices);

        assert!(diagnosis.overround_pct > 2.0 && diagnosis.overround_pct < 3.0);
        assert_eq!(diagnosis.legs[2], "draw@C=3.4");
        assert!(diagnosis.to_string().contains("A=1.02"));
    }
}
