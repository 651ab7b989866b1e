//! Provides a client for the World Air Quality Index (WAQI) JSON API.
//!
//! This module defines the `WaqiClient` struct, which performs the single outbound
//! call behind each proxy endpoint, and `ProviderError`, the explicit result of a
//! failed call.

use crate::error::{AppError, Result};
use crate::models::{ProviderEnvelope, SearchEntry, StationSuggestion};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Default WAQI API base URL.
pub const BASE_URL: &str = "https://api.waqi.info";

/// Outcome of a provider call that did not yield a usable envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport-level failure: DNS, TLS, timeout, connection reset, non-2xx
    /// status, or a body that is not JSON. The text never includes the request URL.
    #[error("{0}")]
    Unavailable(String),

    /// The provider answered, but with something this proxy cannot interpret.
    #[error("{0}")]
    Internal(String),
}

/// Result of a single provider call.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result of a station feed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedLookup {
    /// The station's reading, exactly as WAQI returned it.
    Found(Value),
    /// WAQI reported a non-ok status; carries its `data` field as detail.
    NotFound(Value),
}

/// Result of a station keyword search.
#[derive(Debug, Clone, PartialEq)]
pub enum StationSearch {
    /// Matching stations, in provider order.
    Found(Vec<StationSuggestion>),
    /// WAQI reported a non-ok status.
    NotFound,
}

/// An asynchronous client for the WAQI API.
///
/// Holds the API token for the lifetime of the process. Cloning is cheap: the
/// underlying `reqwest::Client` shares its connection pool between clones.
#[derive(Clone)]
pub struct WaqiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl WaqiClient {
    /// Creates a new `WaqiClient` for `base_url` with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `base_url` is not an absolute http(s) URL and
    /// `AppError::HttpClient` if the TLS backend cannot be initialised.
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Looks up the current reading for a station or city name.
    ///
    /// Corresponds to `GET /feed/{city}/?token=...`.
    pub async fn station_feed(&self, city: &str) -> ProviderResult<FeedLookup> {
        info!("Fetching station feed for: {}", city);

        let url = self.endpoint(&["feed", city, ""], &[])?;
        let envelope = self.fetch_envelope(url).await?;

        if envelope.is_ok() {
            let data = envelope.data.ok_or_else(|| {
                ProviderError::Internal("provider response is missing the 'data' field".into())
            })?;
            debug!("Received station feed for {}", city);
            Ok(FeedLookup::Found(data))
        } else {
            let detail = envelope
                .data
                .unwrap_or_else(|| Value::String("Unknown station".into()));
            info!("Provider reported no station for {}: {}", city, detail);
            Ok(FeedLookup::NotFound(detail))
        }
    }

    /// Searches stations by keyword and reduces each hit to a `StationSuggestion`.
    ///
    /// Corresponds to `GET /search/?keyword=...&token=...`.
    pub async fn search_stations(&self, keyword: &str) -> ProviderResult<StationSearch> {
        info!("Searching stations for keyword: {}", keyword);

        let url = self.endpoint(&["search", ""], &[("keyword", keyword)])?;
        let envelope = self.fetch_envelope(url).await?;

        if !envelope.is_ok() {
            info!("Provider reported no stations for {}", keyword);
            return Ok(StationSearch::NotFound);
        }

        let entries: Vec<SearchEntry> = match envelope.data {
            None => Vec::new(),
            Some(data) => serde_json::from_value(data).map_err(|e| {
                error!("Unexpected search result shape: {}", e);
                ProviderError::Internal(format!("invalid search result: {}", e))
            })?,
        };

        debug!("Received {} stations for {}", entries.len(), keyword);

        Ok(StationSearch::Found(
            entries.into_iter().map(StationSuggestion::from).collect(),
        ))
    }

    /// Builds `{base}/{segments...}?{query}&token={key}`. Each segment is
    /// percent-encoded on its own, so a city name cannot alter the path.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Internal("provider URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("token", &self.api_key);
        Ok(url)
    }

    /// Performs the GET and decodes the WAQI envelope.
    async fn fetch_envelope(&self, url: Url) -> ProviderResult<ProviderEnvelope> {
        let response = self.client.get(url).send().await.map_err(unavailable)?;

        // Check HTTP status code before looking at the body
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                let status = e.status().unwrap_or_default();
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    error!("Received {} from provider. Check AQICN token validity.", status);
                }
                return Err(unavailable(e));
            },
        };

        let body: Value = response.json().await.map_err(unavailable)?;

        serde_json::from_value(body).map_err(|e| {
            error!("Provider response is not a WAQI envelope: {}", e);
            ProviderError::Internal(format!("invalid provider response: {}", e))
        })
    }
}

/// Parses a provider base URL, which must be an absolute http(s) URL that can
/// carry path segments.
///
/// # Errors
///
/// Returns `AppError::Config` otherwise.
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| AppError::Config(format!("invalid provider URL '{}': {}", base_url, e)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "provider URL '{}' must be an http(s) URL",
            base_url
        )));
    }
    Ok(url)
}

/// Logs a transport failure and flattens it, with its causes, into a message.
/// The URL (which carries the token) is stripped first.
fn unavailable(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    let mut details = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        details.push_str(": ");
        details.push_str(&cause.to_string());
        source = cause.source();
    }
    error!("Provider request failed: {}", details);
    ProviderError::Unavailable(details)
}
