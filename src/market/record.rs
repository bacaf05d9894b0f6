//! Flat quote records as served on `/odds` and accepted in snapshots.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::types::{derive_event_id, MarketType, Outcome, Quote};
use crate::error::QuoteError;

/// Label the feed uses for the draw outcome.
pub const DRAW_LABEL: &str = "Draw";

/// One flat odds row: a bookmaker's price for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuoteRecord {
    /// Opaque event identifier; derived from sport and teams when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Sport or league title.
    pub sport_title: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Bookmaker offering the price.
    pub bookmaker: String,
    /// Two-way or three-way market.
    pub market_type: MarketType,
    /// Team name for home/away outcomes, "Draw" for the draw.
    pub outcome_team: String,
    /// Decimal odds.
    pub price: f64,
    /// When the price was captured (RFC 3339).
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub observed_at: Option<OffsetDateTime>,
}

impl QuoteRecord {
    /// Event key this record belongs to.
    pub fn event_key(&self) -> String {
        self.event_id
            .clone()
            .unwrap_or_else(|| derive_event_id(&self.sport_title, &self.home_team, &self.away_team))
    }

    /// Resolve `outcome_team` to an outcome.
    pub fn outcome(&self) -> Result<Outcome, QuoteError> {
        let label = self.outcome_team.trim();
        if label.eq_ignore_ascii_case(&self.home_team) {
            Ok(Outcome::Home)
        } else if label.eq_ignore_ascii_case(&self.away_team) {
            Ok(Outcome::Away)
        } else if label.eq_ignore_ascii_case(DRAW_LABEL) {
            Ok(Outcome::Draw)
        } else {
            Err(QuoteError::UnknownOutcome {
                outcome_team: self.outcome_team.clone(),
                home_team: self.home_team.clone(),
                away_team: self.away_team.clone(),
            })
        }
    }

    /// Convert into a quote. The price is validated later by the normalizer.
    pub fn to_quote(&self) -> Result<Quote, QuoteError> {
        Ok(Quote {
            event_id: self.event_key(),
            sport: self.sport_title.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            bookmaker: self.bookmaker.clone(),
            market_type: self.market_type,
            outcome: self.outcome()?,
            price: self.price,
            observed_at: self.observed_at,
        })
    }
}

impl From<&Quote> for QuoteRecord {
    fn from(quote: &Quote) -> Self {
        let outcome_team = match quote.outcome {
            Outcome::Home => quote.home_team.clone(),
            Outcome::Away => quote.away_team.clone(),
            Outcome::Draw => DRAW_LABEL.to_string(),
        };

        Self {
            event_id: Some(quote.event_id.clone()),
            sport_title: quote.sport.clone(),
            home_team: quote.home_team.clone(),
            away_team: quote.away_team.clone(),
            bookmaker: quote.bookmaker.clone(),
            market_type: quote.market_type,
            outcome_team,
            price: quote.price,
            observed_at: quote.observed_at,
        }
    }
}
