//! Best-price types produced by the quote normalizer.

use serde::Serialize;
use smallvec::SmallVec;

use crate::market::{MarketType, Outcome, Quote};

/// Best price found for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPrice {
    /// Outcome priced.
    pub outcome: Outcome,
    /// Highest decimal odds observed for the outcome.
    pub price: f64,
    /// Bookmaker offering that price (first seen on ties).
    pub bookmaker: String,
}

impl BestPrice {
    /// Bookmaker-implied probability of the outcome.
    pub fn implied_probability(&self) -> f64 {
        1.0 / self.price
    }
}

/// Best price per outcome for one event.
///
/// Holds exactly one entry per outcome required by `market_type`, in
/// home, away, draw order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPriceSet {
    /// Event identifier.
    pub event_id: String,
    /// Sport title.
    pub sport: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Two-way or three-way market.
    pub market_type: MarketType,
    /// Best prices in fixed outcome order.
    pub prices: SmallVec<[BestPrice; 3]>,
}

impl BestPriceSet {
    /// Get the best price for an outcome.
    pub fn get(&self, outcome: Outcome) -> Option<&BestPrice> {
        self.prices.iter().find(|p| p.outcome == outcome)
    }

    /// Iterate best prices in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = &BestPrice> {
        self.prices.iter()
    }

    /// Number of outcomes priced.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Check if no outcome is priced.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Quotes belonging to one event, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuotes {
    /// Event identifier.
    pub event_id: String,
    /// Quotes for the event.
    pub quotes: Vec<Quote>,
}

impl EventQuotes {
    /// Home team of the event, if any quote is present.
    pub fn home_team(&self) -> Option<&str> {
        self.quotes.first().map(|q| q.home_team.as_str())
    }

    /// Away team of the event, if any quote is present.
    pub fn away_team(&self) -> Option<&str> {
        self.quotes.first().map(|q| q.away_team.as_str())
    }
}
