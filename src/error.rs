//! Unified error types for the arbitrage service.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::{MarketType, Outcome};

/// Unified error type for the arbitrage service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Quote validation error.
    #[error("quote error: {0}")]
    Quote(#[from] QuoteError),

    /// Market/normalization error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Stake planning error.
    #[error("stake error: {0}")]
    Stake(#[from] StakeError),

    /// Quote snapshot loading error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating a single quote.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// Decimal odds must be finite and strictly greater than 1.0.
    #[error("invalid price {price} from {bookmaker}: decimal odds must be > 1.0")]
    InvalidPrice {
        /// Bookmaker that quoted the price.
        bookmaker: String,
        /// Offending price.
        price: f64,
    },

    /// Outcome label matches neither team nor the draw.
    #[error("unknown outcome {outcome_team:?} for {home_team} vs {away_team}")]
    UnknownOutcome {
        /// Label carried by the record.
        outcome_team: String,
        /// Home team of the event.
        home_team: String,
        /// Away team of the event.
        away_team: String,
    },

    /// Draw quoted on a market that has no draw.
    #[error("draw quote from {bookmaker} on a two-way market")]
    DrawOnTwoWay {
        /// Bookmaker that quoted the draw.
        bookmaker: String,
    },
}

impl QuoteError {
    /// Short machine-readable reason, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            QuoteError::InvalidPrice { .. } => "invalid_price",
            QuoteError::UnknownOutcome { .. } => "unknown_outcome",
            QuoteError::DrawOnTwoWay { .. } => "draw_on_two_way",
        }
    }
}

/// Errors raised while building the best-price set for one event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// A required outcome has no valid quote.
    #[error("incomplete market for event {event_id}: no valid {missing} quote")]
    IncompleteMarket {
        /// Event missing the outcome.
        event_id: String,
        /// First required outcome without a quote.
        missing: Outcome,
    },

    /// The event has no quotes at all.
    #[error("no quotes for event {event_id}")]
    NoQuotes {
        /// Event with no quotes.
        event_id: String,
    },

    /// Quotes for one event disagree on the market type.
    #[error("mixed market types for event {event_id}: expected {expected}, found {found}")]
    MixedMarketTypes {
        /// Event with inconsistent quotes.
        event_id: String,
        /// Market type of the first quote.
        expected: MarketType,
        /// Conflicting market type.
        found: MarketType,
    },
}

impl MarketError {
    /// Short machine-readable reason, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            MarketError::IncompleteMarket { .. } | MarketError::NoQuotes { .. } => {
                "incomplete_market"
            }
            MarketError::MixedMarketTypes { .. } => "mixed_market_types",
        }
    }
}

/// Stake allocation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StakeError {
    /// Total stake must be positive.
    #[error("invalid stake: {0} (must be > 0)")]
    InvalidStake(Decimal),

    /// A proportion or price could not be represented as a decimal.
    #[error("cannot convert {value} to decimal")]
    NotRepresentable {
        /// Value that failed conversion.
        value: f64,
    },
}

/// Quote snapshot loading errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Snapshot file could not be read.
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        /// Path of the snapshot file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not a JSON array of quote records.
    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        /// Path of the snapshot file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
