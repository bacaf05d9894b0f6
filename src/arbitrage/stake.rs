//! Turning stake proportions into money amounts.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::ArbitrageOpportunity;
use crate::error::StakeError;
use crate::market::Outcome;

/// Money amounts are rounded to cents.
const MONEY_DP: u32 = 2;

/// Bet to place on one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeLeg {
    /// Outcome backed.
    pub outcome: Outcome,
    /// Bookmaker to place the bet with.
    pub bookmaker: String,
    /// Amount to stake.
    pub stake: Decimal,
    /// Return if this outcome wins (stake * price).
    pub payout: Decimal,
}

/// Concrete bets for a total bankroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakePlan {
    /// Bankroll requested.
    pub total_stake: Decimal,
    /// Sum of rounded leg stakes.
    pub total_staked: Decimal,
    /// Bets in home, away, draw order.
    pub legs: Vec<StakeLeg>,
    /// Smallest payout across outcomes.
    pub guaranteed_payout: Decimal,
    /// Guaranteed payout minus amount staked.
    pub guaranteed_profit: Decimal,
}

impl StakePlan {
    /// Leg for one outcome.
    pub fn leg(&self, outcome: Outcome) -> Option<&StakeLeg> {
        self.legs.iter().find(|l| l.outcome == outcome)
    }
}

fn to_money(amount: Decimal) -> Decimal {
    let mut money = amount.round_dp(MONEY_DP);
    money.rescale(MONEY_DP);
    money
}

fn to_decimal(value: f64) -> Result<Decimal, StakeError> {
    Decimal::from_f64(value).ok_or(StakeError::NotRepresentable { value })
}

/// Split `total_stake` across the opportunity's outcomes.
pub fn plan_stakes(
    opportunity: &ArbitrageOpportunity,
    total_stake: Decimal,
) -> Result<StakePlan, StakeError> {
    if total_stake <= Decimal::ZERO {
        return Err(StakeError::InvalidStake(total_stake));
    }

    let legs = opportunity
        .stakes
        .iter()
        .map(|s| {
            let stake = to_money(total_stake * to_decimal(s.stake_proportion)?);
            let payout = to_money(stake * to_decimal(s.price)?);
            Ok(StakeLeg {
                outcome: s.outcome,
                bookmaker: s.bookmaker.clone(),
                stake,
                payout,
            })
        })
        .collect::<Result<Vec<_>, StakeError>>()?;

    let total_staked: Decimal = legs.iter().map(|l| l.stake).sum();
    let guaranteed_payout = legs
        .iter()
        .map(|l| l.payout)
        .min()
        .unwrap_or(Decimal::ZERO);

    Ok(StakePlan {
        total_stake: to_money(total_stake),
        total_staked,
        legs,
        guaranteed_payout,
        guaranteed_profit: guaranteed_payout - total_staked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::calculator::calculate_opportunity;
    use crate::market::MarketType;
    use crate::quotes::{BestPrice, BestPriceSet};
    use rust_decimal_macros::dec;

    fn opportunity(prices: &[(Outcome, f64)]) -> ArbitrageOpportunity {
        let set = BestPriceSet {
            event_id: "evt".to_string(),
            sport: "NBA".to_string(),
            home_team: "Lakers".to_string(),
            away_team: "Celtics".to_string(),
            market_type: if prices.len() == 3 {
                MarketType::ThreeWay
            } else {
                MarketType::TwoWay
            },
            prices: prices
                .iter()
                .map(|&(outcome, price)| BestPrice {
                    outcome,
                    price,
                    bookmaker: format!("{outcome}-book"),
                })
                .collect(),
        };
        calculate_opportunity(&set).expect("opportunity")
    }

    #[test]
    fn even_odds_split_bankroll_in_half() {
        let opp = opportunity(&[(Outcome::Home, 2.10), (Outcome::Away, 2.10)]);

        let plan = plan_stakes(&opp, dec!(100)).unwrap();

        assert_eq!(plan.leg(Outcome::Home).unwrap().stake, dec!(50));
        assert_eq!(plan.leg(Outcome::Away).unwrap().stake, dec!(50));
        assert_eq!(plan.guaranteed_payout, dec!(105));
        assert_eq!(plan.guaranteed_profit, dec!(5));
        assert_eq!(plan.leg(Outcome::Home).unwrap().bookmaker, "home-book");
    }

    #[test]
    fn three_way_payouts_match_within_cents() {
        let opp = opportunity(&[
            (Outcome::Home, 3.2),
            (Outcome::Away, 3.6),
            (Outcome::Draw, 3.9),
        ]);

        let plan = plan_stakes(&opp, dec!(250)).unwrap();
        let max = plan.legs.iter().map(|l| l.payout).max().unwrap();

        assert_eq!(plan.legs.len(), 3);
        assert!(max - plan.guaranteed_payout <= dec!(0.05));
        assert!(plan.guaranteed_profit > Decimal::ZERO);
        assert!((plan.total_staked - dec!(250)).abs() <= dec!(0.02));
    }

    #[test]
    fn rejects_non_positive_stake() {
        let opp = opportunity(&[(Outcome::Home, 2.10), (Outcome::Away, 2.10)]);

        assert_eq!(
            plan_stakes(&opp, Decimal::ZERO),
            Err(StakeError::InvalidStake(Decimal::ZERO))
        );
        assert!(plan_stakes(&opp, dec!(-10)).is_err());
    }
}
