//! Data structures for the World Air Quality Index (WAQI) API and the proxy's own
//! request/response shapes.
//!
//! Includes structs for:
//! - Deserializing the incoming request body (`AqiQuery`).
//! - Deserializing WAQI responses (`ProviderEnvelope`, `SearchEntry`, `StationInfo`).
//! - Serializing the simplified search result sent to the browser (`StationSuggestion`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The provider status value that marks a successful response.
pub const STATUS_OK: &str = "ok";

/// Placeholder shown when a search entry carries no AQI reading.
pub const MISSING_AQI: &str = "-";

/// Request body accepted by `/api/aqi` and `/api/suggest`.
#[derive(Debug, Clone, Deserialize)]
pub struct AqiQuery {
    pub city: String,
}

impl AqiQuery {
    /// Returns the trimmed city name, or `None` if it is blank.
    pub fn city(&self) -> Option<&str> {
        let city = self.city.trim();
        (!city.is_empty()).then_some(city)
    }
}

/// Outer shape shared by every WAQI response.
///
/// Both fields are optional: WAQI omits `data` on some errors, and a missing or
/// non-string `status` is simply treated as "not ok". A `data` key that is
/// present but `null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,
}

impl ProviderEnvelope {
    pub fn is_ok(&self) -> bool {
        matches!(&self.status, Some(Value::String(status)) if status == STATUS_OK)
    }
}

/// Maps a present field to `Some`, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Station identity as reported inside a search entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StationInfo {
    pub name: String,
    /// Usually `[latitude, longitude]`; passed through as reported.
    #[serde(default)]
    pub geo: Value,
}

/// One element of the `data` list returned by the WAQI search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    pub station: StationInfo,
    /// WAQI reports it either as a number or as a string (`"57"`, `"-"`).
    #[serde(default)]
    pub aqi: Option<Value>,
}

/// Simplified station record returned by `/api/suggest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSuggestion {
    pub station_name: String,
    pub geo: Value,
    pub aqi: Value,
}

impl From<SearchEntry> for StationSuggestion {
    fn from(entry: SearchEntry) -> Self {
        Self {
            station_name: entry.station.name,
            geo: entry.station.geo,
            aqi: entry
                .aqi
                .filter(|aqi| !aqi.is_null())
                .unwrap_or_else(|| Value::String(MISSING_AQI.to_string())),
        }
    }
}
