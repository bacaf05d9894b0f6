//! Sports-betting arbitrage detection and stake allocation.
//!
//! Given every bookmaker's decimal odds for an event, the service takes the
//! best price per outcome and checks whether backing all outcomes across
//! bookmakers guarantees a profit:
//!
//! ```text
//! HOME @ 2.10 (Bet365)   implied 0.4762
//! AWAY @ 2.10 (Unibet)   implied 0.4762
//! ─────────────────────────────────────
//! Sum:                   0.9524 < 1.00 ✅
//! Margin:                5.00% guaranteed, stake 50% / 50%
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Outcomes, market types and quote records
//! - [`quotes`]: Snapshots, freshness and best-price selection
//! - [`arbitrage`]: Opportunity detection, batch scans and stake sizing
//! - [`api`]: HTTP API for odds, arbitrage, health and metrics
//! - [`metrics`]: Prometheus metric helpers
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod quotes;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
