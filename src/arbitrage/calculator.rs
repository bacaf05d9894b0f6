//! Sure-bet calculation over a best-price set.
//!
//! For decimal odds `o_i`, the implied probabilities `1 / o_i` sum to `A`.
//! When `A < 1`, staking `(1 / o_i) / A` of the bankroll on every outcome
//! pays `bankroll / A` whichever outcome occurs:
//!
//! ```text
//! HOME @ 2.10 (Bookie A)  1/2.10 = 0.4762
//! AWAY @ 2.10 (Bookie B)  1/2.10 = 0.4762
//! ───────────────────────────────────────
//! A = 0.9524 < 1  ->  margin = (1 - A) / A = 5.00%
//! ```

use serde::Serialize;
use smallvec::SmallVec;

use crate::market::{MarketType, Outcome};
use crate::quotes::BestPriceSet;
use crate::utils::round_dp;

/// Stake allocation for one outcome of an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeStake {
    /// Outcome backed.
    pub outcome: Outcome,
    /// Bookmaker offering the best price.
    pub bookmaker: String,
    /// Best decimal odds.
    pub price: f64,
    /// `1 / price`.
    pub implied_probability: f64,
    /// Fraction of the total stake to place on this outcome.
    pub stake_proportion: f64,
}

/// Detected arbitrage opportunity for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
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
    /// Sum of implied probabilities (`A`).
    pub arbitrage_percentage: f64,
    /// Guaranteed return on total stake, in percent (full precision).
    pub profit_margin: f64,
    /// Per-outcome allocation in home, away, draw order.
    pub stakes: SmallVec<[OutcomeStake; 3]>,
}

impl ArbitrageOpportunity {
    /// Profit margin rounded to 2 decimal places for display.
    pub fn profit_margin_display(&self) -> f64 {
        round_dp(self.profit_margin, 2)
    }

    /// Allocation for one outcome.
    pub fn stake(&self, outcome: Outcome) -> Option<&OutcomeStake> {
        self.stakes.iter().find(|s| s.outcome == outcome)
    }

    /// Payout per unit staked, identical for every outcome (`1 / A`).
    pub fn payout_multiple(&self) -> f64 {
        1.0 / self.arbitrage_percentage
    }
}

/// Bookmaker-implied probability of decimal odds.
pub fn implied_probability(price: f64) -> f64 {
    1.0 / price
}

/// Sum of implied probabilities across every outcome of the set.
pub fn arbitrage_percentage(prices: &BestPriceSet) -> f64 {
    prices.iter().map(|p| implied_probability(p.price)).sum()
}

/// Percentage return on total stake for a given `A`.
pub fn profit_margin(arbitrage_percentage: f64) -> f64 {
    (1.0 - arbitrage_percentage) / arbitrage_percentage * 100.0
}

/// Evaluate a best-price set.
///
/// Returns `None` when `A >= 1`; the boundary `A == 1` is not an opportunity.
pub fn calculate_opportunity(prices: &BestPriceSet) -> Option<ArbitrageOpportunity> {
    if prices.is_empty() {
        return None;
    }

    let total = arbitrage_percentage(prices);
    if total >= 1.0 {
        return None;
    }

    let stakes = prices
        .iter()
        .map(|best| {
            let implied = implied_probability(best.price);
            OutcomeStake {
                outcome: best.outcome,
                bookmaker: best.bookmaker.clone(),
                price: best.price,
                implied_probability: implied,
                stake_proportion: implied / total,
            }
        })
        .collect();

    Some(ArbitrageOpportunity {
        event_id: prices.event_id.clone(),
        sport: prices.sport.clone(),
        home_team: prices.home_team.clone(),
        away_team: prices.away_team.clone(),
        market_type: prices.market_type,
        arbitrage_percentage: total,
        profit_margin: profit_margin(total),
        stakes,
    })
}
