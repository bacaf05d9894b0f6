//! Immutable quote snapshots.

use std::path::Path;

use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::error::{QuoteError, SnapshotError};
use crate::market::{Quote, QuoteRecord};
use crate::metrics;

/// Point-in-time set of odds rows, in feed order.
#[derive(Debug, Clone)]
pub struct QuoteSnapshot {
    /// Raw rows as received.
    pub records: Vec<QuoteRecord>,
    /// When the snapshot was taken.
    pub taken_at: OffsetDateTime,
}

impl QuoteSnapshot {
    /// Create a snapshot from rows.
    pub fn new(records: Vec<QuoteRecord>, taken_at: OffsetDateTime) -> Self {
        Self { records, taken_at }
    }

    /// Empty snapshot.
    pub fn empty() -> Self {
        Self::new(Vec::new(), OffsetDateTime::now_utc())
    }

    /// Load a snapshot from a JSON array file.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        let display = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: display.clone(),
                source,
            })?;
        let records: Vec<QuoteRecord> =
            serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Parse {
                path: display,
                source,
            })?;

        info!(records = records.len(), "Quote snapshot loaded");
        Ok(Self::new(records, OffsetDateTime::now_utc()))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert rows into quotes, discarding rows that cannot be resolved.
    ///
    /// Prices are not checked here; the normalizer discards invalid ones.
    pub fn quotes(&self) -> (Vec<Quote>, Vec<QuoteError>) {
        let mut quotes = Vec::with_capacity(self.records.len());
        let mut rejected = Vec::new();

        for record in &self.records {
            match record.to_quote() {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    debug!(error = %e, "Quote record rejected");
                    metrics::inc_quotes_discarded(e.reason());
                    rejected.push(e);
                }
            }
        }

        (quotes, rejected)
    }
}

impl Default for QuoteSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
