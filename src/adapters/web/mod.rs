//! HTTP JSON API over a [`TradeStore`].
//!
//! Read-only: the map summary, country names, country statistics and company
//! detail, plus a health check. CORS is open to any origin.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::error::TradeMapError;
use crate::domain::lookup::StatsLimits;
use crate::ports::trade_store::TradeStore;

pub struct AppState {
    pub store: Arc<dyn TradeStore + Send + Sync>,
    pub limits: StatsLimits,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/countries", get(handlers::list_countries))
        .route("/api/country-names", get(handlers::country_names))
        .route("/api/countries/{name}/stats", get(handlers::country_stats))
        .route("/api/companies/{name}", get(handlers::company_detail))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), TradeMapError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "trade map API listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
