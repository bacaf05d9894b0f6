//! Arbitrage module for detecting sure bets and sizing stakes.
//!
//! This module handles:
//! - Implied-probability and profit-margin calculations
//! - Per-event detection from raw quotes
//! - Batch scans with per-event isolation
//! - Converting stake proportions into money amounts

pub mod calculator;
pub mod detector;
pub mod scanner;
pub mod stake;

pub use calculator::{calculate_opportunity, ArbitrageOpportunity, OutcomeStake};
pub use detector::{check_arbitrage, check_event, diagnose_no_opportunity, EventCheck, EventFailure};
pub use scanner::{scan, scan_parallel, ScanOptions, ScanReport, SkippedEvent};
pub use stake::{plan_stakes, StakeLeg, StakePlan};
