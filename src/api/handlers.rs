//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::arbitrage::{plan_stakes, scan, scan_parallel, ArbitrageOpportunity, ScanReport, StakePlan};
use crate::config::Config;
use crate::error::StakeError;
use crate::market::{Outcome, QuoteRecord};
use crate::metrics;
use crate::quotes::QuoteSnapshot;

/// Header carrying the number of events skipped by a scan.
pub const SKIPPED_EVENTS_HEADER: &str = "x-skipped-events";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether a quote snapshot has been loaded.
    pub ready: Arc<AtomicBool>,
    /// Current quote snapshot; replaced wholesale, never mutated.
    pub snapshot: Arc<RwLock<Arc<QuoteSnapshot>>>,
    /// Summary of the most recent scan.
    pub last_scan: Arc<RwLock<Option<ScanSummary>>>,
    /// Service configuration.
    pub config: Arc<Config>,
    /// Prometheus exporter handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state with an empty snapshot.
    pub fn new(config: Config) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(RwLock::new(Arc::new(QuoteSnapshot::empty()))),
            last_scan: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Swap in a new snapshot and mark the service ready.
    pub async fn replace_snapshot(&self, snapshot: QuoteSnapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
        metrics::inc_snapshots_loaded();
        self.set_ready(true);
    }

    /// Current snapshot; the lock is released before returning.
    pub async fn current_snapshot(&self) -> Arc<QuoteSnapshot> {
        self.snapshot.read().await.clone()
    }
}

/// API error rendered as a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Client sent an invalid request.
    BadRequest(String),
    /// Server failed to complete the request.
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<StakeError> for ApiError {
    fn from(e: StakeError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    #[schema(value_type = String)]
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether a snapshot is loaded.
    pub ready: bool,
    /// Rows in the current snapshot.
    pub quotes: usize,
}

/// Summary of one scan.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanSummary {
    /// When the scan ran (RFC 3339).
    pub scanned_at: Option<String>,
    /// Events evaluated.
    pub events_evaluated: usize,
    /// Opportunities found.
    pub opportunities: usize,
    /// Events skipped.
    pub skipped: usize,
    /// Quotes discarded as stale or invalid.
    pub quotes_discarded: usize,
}

impl ScanSummary {
    fn from_report(report: &ScanReport, scanned_at: OffsetDateTime) -> Self {
        Self {
            scanned_at: scanned_at.format(&Rfc3339).ok(),
            events_evaluated: report.events_evaluated,
            opportunities: report.opportunities.len(),
            skipped: report.skipped.len(),
            quotes_discarded: report.quotes_discarded,
        }
    }
}

/// Status response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Service status.
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Rows in the current snapshot.
    pub quotes: usize,
    /// When the snapshot was taken (RFC 3339).
    pub snapshot_taken_at: Option<String>,
    /// Most recent scan, if any.
    pub last_scan: Option<ScanSummary>,
}

/// Query parameters for `/check-arbitrage`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckArbitrageParams {
    /// Bankroll to split across outcomes; adds `stakes` to each record.
    #[param(value_type = Option<String>)]
    pub stake: Option<Decimal>,
}

/// Money amounts for one opportunity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StakeSummary {
    /// Bankroll requested.
    #[schema(value_type = String)]
    pub total: Decimal,
    /// Stake on the home outcome.
    #[schema(value_type = String)]
    pub home: Decimal,
    /// Stake on the away outcome.
    #[schema(value_type = String)]
    pub away: Decimal,
    /// Stake on the draw, for three-way markets.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub draw: Option<Decimal>,
    /// Payout whichever outcome occurs.
    #[schema(value_type = String)]
    pub payout: Decimal,
    /// Guaranteed profit.
    #[schema(value_type = String)]
    pub profit: Decimal,
}

impl From<&StakePlan> for StakeSummary {
    fn from(plan: &StakePlan) -> Self {
        let stake_on = |outcome| plan.leg(outcome).map(|l| l.stake);
        Self {
            total: plan.total_stake,
            home: stake_on(Outcome::Home).unwrap_or_default(),
            away: stake_on(Outcome::Away).unwrap_or_default(),
            draw: stake_on(Outcome::Draw),
            payout: plan.guaranteed_payout,
            profit: plan.guaranteed_profit,
        }
    }
}

/// Opportunity record in the shape the UI consumes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OpportunityRecord {
    /// Event identifier.
    pub event_id: String,
    /// Sport title.
    pub sport_title: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Guaranteed return in percent, rounded to 2 decimals.
    #[serde(rename = "profitMargin")]
    pub profit_margin: f64,
    /// Bookmaker for the home bet.
    #[serde(rename = "homeBookmaker")]
    pub home_bookmaker: String,
    /// Fraction of the bankroll on home.
    #[serde(rename = "betProportionHome")]
    pub bet_proportion_home: f64,
    /// Bookmaker for the away bet.
    #[serde(rename = "awayBookmaker")]
    pub away_bookmaker: String,
    /// Fraction of the bankroll on away.
    #[serde(rename = "betProportionAway")]
    pub bet_proportion_away: f64,
    /// Bookmaker for the draw bet (three-way only).
    #[serde(rename = "drawBookmaker", skip_serializing_if = "Option::is_none")]
    pub draw_bookmaker: Option<String>,
    /// Fraction of the bankroll on the draw (three-way only).
    #[serde(rename = "betProportionDraw", skip_serializing_if = "Option::is_none")]
    pub bet_proportion_draw: Option<f64>,
    /// Money amounts, when a stake was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stakes: Option<StakeSummary>,
}

impl OpportunityRecord {
    /// Build a record, optionally sizing stakes for `total_stake`.
    ///
    /// Only a non-positive stake is an error. When this opportunity's prices
    /// cannot be sized in money, the record is returned without `stakes`.
    pub fn new(opp: &ArbitrageOpportunity, total_stake: Option<Decimal>) -> Result<Self, StakeError> {
        let stakes = match total_stake.map(|total| plan_stakes(opp, total)).transpose() {
            Ok(plan) => plan.as_ref().map(StakeSummary::from),
            Err(e @ StakeError::InvalidStake(_)) => return Err(e),
            Err(e) => {
                warn!(event_id = %opp.event_id, error = %e, "Stakes not sized for opportunity");
                None
            }
        };

        let leg = |outcome| opp.stake(outcome);
        let bookmaker = |outcome| leg(outcome).map(|s| s.bookmaker.clone());
        let proportion = |outcome| leg(outcome).map(|s| s.stake_proportion);

        Ok(Self {
            event_id: opp.event_id.clone(),
            sport_title: opp.sport.clone(),
            home_team: opp.home_team.clone(),
            away_team: opp.away_team.clone(),
            profit_margin: opp.profit_margin_display(),
            home_bookmaker: bookmaker(Outcome::Home).unwrap_or_default(),
            bet_proportion_home: proportion(Outcome::Home).unwrap_or_default(),
            away_bookmaker: bookmaker(Outcome::Away).unwrap_or_default(),
            bet_proportion_away: proportion(Outcome::Away).unwrap_or_default(),
            draw_bookmaker: bookmaker(Outcome::Draw),
            bet_proportion_draw: proportion(Outcome::Draw),
            stakes,
        })
    }
}

/// Response to a snapshot replacement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReplaceQuotesResponse {
    /// Rows kept in the new snapshot.
    pub accepted: usize,
    /// Rows dropped because their outcome could not be resolved.
    pub discarded: usize,
}

/// Health check handler - always returns 200.
#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once a snapshot is loaded, 503 otherwise.
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, body = ReadyResponse),
        (status = 503, body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let quotes = state.current_snapshot().await.len();

    let response = ReadyResponse {
        ready: is_ready,
        quotes,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns snapshot and last scan statistics.
#[utoipa::path(get, path = "/api/v1/status", responses((status = 200, body = StatusResponse)))]
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.current_snapshot().await;
    let last_scan = state.last_scan.read().await.clone();

    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        quotes: snapshot.len(),
        snapshot_taken_at: snapshot.taken_at.format(&Rfc3339).ok(),
        last_scan,
    })
}

/// Odds handler - returns the current snapshot rows in feed order.
#[utoipa::path(get, path = "/odds", responses((status = 200, body = [QuoteRecord])))]
pub async fn odds(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let snapshot = state.current_snapshot().await;
    let body = Json(snapshot.records.clone());
    metrics::record_http_latency(start, "/odds");
    body
}

/// Arbitrage handler - scans the current snapshot and returns opportunities.
#[utoipa::path(
    get,
    path = "/check-arbitrage",
    params(CheckArbitrageParams),
    responses(
        (status = 200, body = [OpportunityRecord]),
        (status = 400, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn check_arbitrage(
    State(state): State<AppState>,
    Query(params): Query<CheckArbitrageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let total_stake = params.stake.or(state.config.default_stake);
    if let Some(stake) = total_stake {
        if stake <= Decimal::ZERO {
            return Err(StakeError::InvalidStake(stake).into());
        }
    }

    let snapshot = state.current_snapshot().await;
    let now = OffsetDateTime::now_utc();
    let options = state.config.scan_options(now);
    let (quotes, rejected) = snapshot.quotes();

    let mut report = if state.config.parallel_scan {
        scan_parallel(quotes, &options).await
    } else {
        tokio::task::spawn_blocking(move || scan(quotes, &options))
            .await
            .map_err(|e| {
                error!(error = %e, "Scan task failed");
                ApiError::Internal("scan failed".to_string())
            })?
    };
    report.quotes_discarded += rejected.len();

    let records = report
        .opportunities
        .iter()
        .map(|opp| OpportunityRecord::new(opp, total_stake))
        .collect::<Result<Vec<_>, _>>()?;

    *state.last_scan.write().await = Some(ScanSummary::from_report(&report, now));

    let mut headers = HeaderMap::new();
    headers.insert(SKIPPED_EVENTS_HEADER, HeaderValue::from(report.skipped.len()));

    metrics::record_http_latency(start, "/check-arbitrage");
    Ok((headers, Json(records)))
}

/// Snapshot replacement handler - swaps in a new set of odds rows.
#[utoipa::path(
    post,
    path = "/quotes",
    request_body = [QuoteRecord],
    responses((status = 200, body = ReplaceQuotesResponse))
)]
pub async fn replace_quotes(
    State(state): State<AppState>,
    Json(records): Json<Vec<QuoteRecord>>,
) -> impl IntoResponse {
    let total = records.len();
    let accepted: Vec<QuoteRecord> = records
        .into_iter()
        .filter(|r| match r.outcome() {
            Ok(_) => true,
            Err(e) => {
                metrics::inc_quotes_discarded(e.reason());
                false
            }
        })
        .collect();
    let response = ReplaceQuotesResponse {
        accepted: accepted.len(),
        discarded: total - accepted.len(),
    };

    state
        .replace_snapshot(QuoteSnapshot::new(accepted, OffsetDateTime::now_utc()))
        .await;
    info!(
        accepted = response.accepted,
        discarded = response.discarded,
        "Quote snapshot replaced"
    );

    Json(response)
}

/// Prometheus metrics handler.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
