//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Path, State},
    http::Uri,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::domain::country_stats::CountryStats;
use crate::domain::error::TradeMapError;
use crate::domain::lookup::{CompanyDetail, company_report, country_report};
use crate::domain::map_summary::MapCountry;

use super::{AppState, WebError};

/// Store calls block, so they run off the async workers.
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, TradeMapError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| WebError::internal(e.to_string()))?
        .map_err(WebError::from)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MapCountry>>, WebError> {
    blocking(&state, |s| s.store.map_countries()).await.map(Json)
}

pub async fn country_names(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, WebError> {
    blocking(&state, |s| s.store.list_countries()).await.map(Json)
}

pub async fn country_stats(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CountryStats>, WebError> {
    blocking(&state, move |s| country_report(&*s.store, &name, s.limits))
        .await
        .map(Json)
}

pub async fn company_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CompanyDetail>, WebError> {
    blocking(&state, move |s| company_report(&*s.store, &name, s.limits))
        .await
        .map(Json)
}

pub async fn not_found(uri: Uri) -> WebError {
    WebError::not_found(format!("no route for {}", uri.path()))
}
