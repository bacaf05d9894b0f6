//! Event, outcome and quote types for bookmaker markets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::QuoteError;

/// Match outcome a bookmaker prices.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Outcome {
    /// Home team wins.
    Home,
    /// Away team wins.
    Away,
    /// Match ends level.
    Draw,
}

/// Whether a market includes a draw.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarketType {
    /// Home/away only (moneyline).
    #[serde(alias = "h2h")]
    #[strum(to_string = "two_way", serialize = "h2h")]
    TwoWay,
    /// Home/away/draw (1X2).
    #[serde(alias = "h2h_3_way")]
    #[strum(to_string = "three_way", serialize = "h2h_3_way")]
    ThreeWay,
}

impl MarketType {
    /// Outcomes that must be quoted for the market to be complete.
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            MarketType::TwoWay => &[Outcome::Home, Outcome::Away],
            MarketType::ThreeWay => &[Outcome::Home, Outcome::Away, Outcome::Draw],
        }
    }

    /// Check whether the outcome belongs to this market.
    pub fn has_outcome(&self, outcome: Outcome) -> bool {
        self.outcomes().contains(&outcome)
    }
}

/// One bookmaker's price for one outcome of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Grouping key for quotes of the same match.
    pub event_id: String,
    /// Sport title (e.g., "EPL").
    pub sport: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Bookmaker offering the price.
    pub bookmaker: String,
    /// Two-way or three-way market.
    pub market_type: MarketType,
    /// Outcome being priced.
    pub outcome: Outcome,
    /// Decimal odds.
    pub price: f64,
    /// When the price was captured, if known.
    pub observed_at: Option<OffsetDateTime>,
}

impl Quote {
    /// Validate the decimal price of this quote.
    pub fn validated_price(&self) -> Result<f64, QuoteError> {
        validate_price(self.price, &self.bookmaker)
    }

    /// Check whether the quote was captured before `cutoff`.
    ///
    /// Quotes without a timestamp are never stale.
    pub fn is_older_than(&self, cutoff: OffsetDateTime) -> bool {
        self.observed_at.is_some_and(|at| at < cutoff)
    }
}

/// Reject decimal odds that are not finite or not strictly above 1.0.
pub fn validate_price(price: f64, bookmaker: &str) -> Result<f64, QuoteError> {
    if price.is_finite() && price > 1.0 {
        Ok(price)
    } else {
        Err(QuoteError::InvalidPrice {
            bookmaker: bookmaker.to_string(),
            price,
        })
    }
}

/// Derive an event key when the feed does not supply one.
pub fn derive_event_id(sport: &str, home_team: &str, away_team: &str) -> String {
    format!("{sport}|{home_team}|{away_team}")
}
