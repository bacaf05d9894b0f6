//! Best-price selection and event grouping.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::{debug, instrument};

use super::types::{BestPrice, BestPriceSet, EventQuotes};
use crate::error::{MarketError, QuoteError};
use crate::market::{MarketType, Outcome, Quote};
use crate::metrics;

/// Fold accumulator keeping the best price per outcome for one event.
///
/// Ties keep the first-seen bookmaker.
#[derive(Debug, Clone)]
pub struct PriceBoard {
    event_id: String,
    sport: String,
    home_team: String,
    away_team: String,
    market_type: MarketType,
    best: HashMap<Outcome, BestPrice>,
    conflict: Option<MarketType>,
    discarded: Vec<QuoteError>,
}

impl PriceBoard {
    /// Start a board using the descriptive fields of the event's first quote.
    pub fn new(first: &Quote) -> Self {
        Self {
            event_id: first.event_id.clone(),
            sport: first.sport.clone(),
            home_team: first.home_team.clone(),
            away_team: first.away_team.clone(),
            market_type: first.market_type,
            best: HashMap::with_capacity(3),
            conflict: None,
            discarded: Vec::new(),
        }
    }

    /// Fold every quote of one event into a board.
    ///
    /// Returns `None` for an empty slice.
    pub fn collect(quotes: &[Quote]) -> Option<Self> {
        let first = quotes.first()?;
        Some(quotes.iter().fold(Self::new(first), |mut board, quote| {
            board.offer(quote);
            board
        }))
    }

    /// Offer one quote to the board.
    pub fn offer(&mut self, quote: &Quote) {
        if quote.market_type != self.market_type {
            self.conflict.get_or_insert(quote.market_type);
            return;
        }

        let price = match quote.validated_price() {
            Ok(price) => price,
            Err(e) => return self.discard(e),
        };

        if !self.market_type.has_outcome(quote.outcome) {
            return self.discard(QuoteError::DrawOnTwoWay {
                bookmaker: quote.bookmaker.clone(),
            });
        }

        match self.best.entry(quote.outcome) {
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if price > current.price {
                    current.price = price;
                    current.bookmaker.clone_from(&quote.bookmaker);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(BestPrice {
                    outcome: quote.outcome,
                    price,
                    bookmaker: quote.bookmaker.clone(),
                });
            }
        }
    }

    fn discard(&mut self, error: QuoteError) {
        debug!(event_id = %self.event_id, error = %error, "Quote discarded");
        metrics::inc_quotes_discarded(error.reason());
        self.discarded.push(error);
    }

    /// Quotes rejected so far.
    pub fn discarded(&self) -> &[QuoteError] {
        &self.discarded
    }

    /// Close the board into a best-price set.
    pub fn finish(mut self) -> Result<BestPriceSet, MarketError> {
        if let Some(found) = self.conflict {
            return Err(MarketError::MixedMarketTypes {
                event_id: self.event_id,
                expected: self.market_type,
                found,
            });
        }

        let mut prices = SmallVec::new();
        for &outcome in self.market_type.outcomes() {
            match self.best.remove(&outcome) {
                Some(best) => prices.push(best),
                None => {
                    return Err(MarketError::IncompleteMarket {
                        event_id: self.event_id,
                        missing: outcome,
                    })
                }
            }
        }

        Ok(BestPriceSet {
            event_id: self.event_id,
            sport: self.sport,
            home_team: self.home_team,
            away_team: self.away_team,
            market_type: self.market_type,
            prices,
        })
    }
}

/// Select the best valid price per outcome for one event's quotes.
#[instrument(skip(quotes), fields(quotes = quotes.len()))]
pub fn best_prices(event_id: &str, quotes: &[Quote]) -> Result<BestPriceSet, MarketError> {
    match PriceBoard::collect(quotes) {
        Some(board) => board.finish(),
        None => Err(MarketError::NoQuotes {
            event_id: event_id.to_string(),
        }),
    }
}

/// Partition quotes by event, preserving first-seen event order.
pub fn group_by_event(quotes: impl IntoIterator<Item = Quote>) -> Vec<EventQuotes> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut events: Vec<EventQuotes> = Vec::new();

    for quote in quotes {
        match index.get(&quote.event_id) {
            Some(&i) => events[i].quotes.push(quote),
            None => {
                index.insert(quote.event_id.clone(), events.len());
                events.push(EventQuotes {
                    event_id: quote.event_id.clone(),
                    quotes: vec![quote],
                });
            }
        }
    }

    events
}
