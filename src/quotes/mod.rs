//! Quote module for turning raw odds into best prices.
//!
//! This module handles:
//! - Quote snapshots (loading and conversion)
//! - Max-age filtering of stale quotes
//! - Grouping by event and best-price selection per outcome

pub mod freshness;
pub mod normalizer;
pub mod snapshot;
pub mod types;

pub use freshness::{max_age_from_secs, retain_fresh};
pub use normalizer::{best_prices, group_by_event, PriceBoard};
pub use snapshot::QuoteSnapshot;
pub use types::{BestPrice, BestPriceSet, EventQuotes};
