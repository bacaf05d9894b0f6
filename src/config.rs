//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::arbitrage::ScanOptions;
use crate::error::{AppError, Result};

/// Upper bound for `QUOTE_MAX_AGE_SECS` (one year).
pub const MAX_QUOTE_AGE_SECS: u64 = 365 * 24 * 60 * 60;
use crate::quotes::max_age_from_secs;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Quote Snapshot ===
    /// JSON file with the initial quote snapshot.
    #[serde(default)]
    pub quotes_path: Option<PathBuf>,

    /// Maximum quote age in seconds before it is ignored (0 = disabled).
    #[serde(default)]
    pub quote_max_age_secs: u64,

    // === Detection Parameters ===
    /// Minimum profit margin in percent for an opportunity to be surfaced.
    #[serde(default)]
    pub min_profit_margin: Decimal,

    /// Bankroll used to size stakes when a request does not give one.
    #[serde(default)]
    pub default_stake: Option<Decimal>,

    /// Evaluate events on separate tasks.
    #[serde(default = "default_true")]
    pub parallel_scan: bool,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin to call the API (browser UI on another host).
    #[serde(default = "default_true")]
    pub cors_permissive: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quotes_path: None,
            quote_max_age_secs: 0,
            min_profit_margin: Decimal::ZERO,
            default_stake: None,
            parallel_scan: default_true(),
            port: default_port(),
            cors_permissive: default_true(),
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> std::result::Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Load and validate configuration.
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(AppError::InvalidConfig)?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_profit_margin < Decimal::ZERO {
            return Err("MIN_PROFIT_MARGIN must not be negative".to_string());
        }

        if self.min_profit_margin >= Decimal::ONE_HUNDRED {
            return Err("MIN_PROFIT_MARGIN must be below 100".to_string());
        }

        if self.quote_max_age_secs > MAX_QUOTE_AGE_SECS {
            return Err(format!(
                "QUOTE_MAX_AGE_SECS must be at most {MAX_QUOTE_AGE_SECS}"
            ));
        }

        if let Some(stake) = self.default_stake {
            if stake <= Decimal::ZERO {
                return Err("DEFAULT_STAKE must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Minimum profit margin as a float percentage.
    pub fn min_profit_margin_f64(&self) -> f64 {
        self.min_profit_margin.to_f64().unwrap_or(0.0)
    }

    /// Scan parameters for a scan taken at `now`.
    pub fn scan_options(&self, now: OffsetDateTime) -> ScanOptions {
        ScanOptions {
            now,
            max_quote_age: max_age_from_secs(self.quote_max_age_secs),
            min_profit_margin: self.min_profit_margin_f64(),
        }
    }
}
