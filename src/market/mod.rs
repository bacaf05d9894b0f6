//! Market module for bookmaker odds.
//!
//! This module handles:
//! - Outcome and market-type enums
//! - Quote type and price validation
//! - Flat quote records exchanged with the UI and the odds snapshot

pub mod record;
pub mod types;

pub use record::QuoteRecord;
pub use types::{derive_event_id, validate_price, MarketType, Outcome, Quote};
