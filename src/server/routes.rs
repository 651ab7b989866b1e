//! Route table and request handlers.
//!
//! Each `/api/*` handler validates the body, performs one provider call, and maps
//! the outcome onto either a JSON payload or an `ApiError`.

use crate::api::{FeedLookup, StationSearch, WaqiClient};
use crate::error::ApiError;
use crate::models::{AqiQuery, StationSuggestion};
use crate::server::cors::permissive_cors;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

/// Landing page, embedded at compile time.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: WaqiClient,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/aqi", post(station_feed))
        .route("/api/suggest", post(suggest_stations))
        .layer(middleware::from_fn(permissive_cors))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/aqi - current reading for a station or city
#[instrument(skip_all)]
async fn station_feed(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let query = parse_query(&body)?;
    let city = query.city().ok_or(ApiError::InvalidInput)?;
    info!(city, "Station feed requested");

    match state.provider.station_feed(city).await? {
        FeedLookup::Found(data) => Ok(Json(data)),
        FeedLookup::NotFound(detail) => Err(ApiError::NotFound(detail)),
    }
}

/// POST /api/suggest - candidate stations for a keyword
#[instrument(skip_all)]
async fn suggest_stations(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<StationSuggestion>>, ApiError> {
    let query = parse_query(&body)?;
    let city = query.city().ok_or(ApiError::InvalidInput)?;
    info!(city, "Station suggestions requested");

    match state.provider.search_stations(city).await? {
        StationSearch::Found(stations) => {
            info!(count = stations.len(), "Returning station suggestions");
            Ok(Json(stations))
        },
        // Provider detail is dropped here; the client always sees the same message
        StationSearch::NotFound => Err(ApiError::NotFound(json!("No stations found"))),
    }
}

/// Decodes `{"city": ...}`. An empty body, invalid JSON, or a missing or
/// non-string `city` are all the same client error.
fn parse_query(body: &[u8]) -> Result<AqiQuery, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejecting request body: {}", e);
        ApiError::InvalidInput
    })
}
