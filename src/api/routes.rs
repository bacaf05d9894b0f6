//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    check_arbitrage, health, odds, prometheus_metrics, ready, replace_quotes, status, AppState,
    ErrorResponse, HealthResponse, OpportunityRecord, ReadyResponse, ReplaceQuotesResponse,
    ScanSummary, StakeSummary, StatusResponse,
};
use crate::market::{MarketType, QuoteRecord};

/// OpenAPI document for the service.
#[derive(OpenApi)]
#[openapi(
    info(title = "sports-arb", description = "Sports-betting arbitrage detection API"),
    paths(
        super::handlers::health,
        super::handlers::ready,
        super::handlers::status,
        super::handlers::odds,
        super::handlers::check_arbitrage,
        super::handlers::replace_quotes
    ),
    components(schemas(
        QuoteRecord,
        MarketType,
        OpportunityRecord,
        StakeSummary,
        ReplaceQuotesResponse,
        HealthResponse,
        ReadyResponse,
        StatusResponse,
        ScanSummary,
        ErrorResponse
    ))
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors_permissive = state.config.cors_permissive;

    let router = Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Status and metrics
        .route("/api/v1/status", get(status))
        .route("/metrics", get(prometheus_metrics))
        // Odds and arbitrage
        .route("/odds", get(odds))
        .route("/check-arbitrage", get(check_arbitrage))
        .route("/quotes", post(replace_quotes))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
