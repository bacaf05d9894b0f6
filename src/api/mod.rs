//! HTTP API module for odds, arbitrage, health and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, OpportunityRecord};
pub use routes::{create_router, ApiDoc};
