//! Shared domain types: stations, settings, readings and series.
//!
//! Everything here is plain data. Field names serialize in camelCase so the
//! persisted document and the REST payloads share one wire format.

use serde::{Deserialize, Serialize};

/// Maximum number of locations the store accepts.
pub const MAX_LOCATIONS: usize = 25;

/// Maximum number of comparison locations shown on the dashboard.
pub const MAX_DASHBOARD_LOCATIONS: usize = 3;

/// Lower bound of the client refresh interval, in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: i64 = 60;

/// Upper bound of the client refresh interval, in seconds.
pub const MAX_REFRESH_INTERVAL_SECS: i64 = 3600;

/// Refresh interval used when a document predates the setting.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u32 = 300;

/// Whether a station sits on the coast or inland.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Coast,
    Interior,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Coast => "coast",
            LocationType::Interior => "interior",
        }
    }

    /// Parse the wire name of a location type. Returns `None` for anything
    /// other than `coast` or `interior`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coast" => Some(LocationType::Coast),
            "interior" => Some(LocationType::Interior),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A geographic station. `id` is the join key used everywhere else and
/// never changes once the location is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// Short human label, usually the airport code.
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    /// Elevation in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

/// Global settings stored alongside the location set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Reference point for every gradient. Must name an existing location.
    pub home_location_id: String,
    /// Up to three comparison locations, in display order.
    #[serde(default)]
    pub dashboard_location_ids: Vec<String>,
    /// Suggested client refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub api_refresh_interval: u32,
}

fn default_refresh_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

/// The persisted configuration document: the location set plus settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDocument {
    pub locations: Vec<Location>,
    #[serde(flatten)]
    pub settings: Settings,
}

impl LocationDocument {
    /// Look up a location by id.
    pub fn find(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Position of a location in display order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.locations.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// The current home location, if the document is consistent.
    pub fn home_location(&self) -> Option<&Location> {
        self.find(&self.settings.home_location_id)
    }
}

/// Partial settings update. Absent fields are left untouched.
///
/// `api_refresh_interval` is signed so out-of-range values reach validation
/// instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_location_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_refresh_interval: Option<i64>,
}

/// A bare pressure series: `time[i]` corresponds to `pressure[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureSeries {
    pub time: Vec<String>,
    pub pressure: Vec<f64>,
}

/// Forecast window attached to a reading. Temperature, when present, is
/// parallel to `time` as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time: Vec<String>,
    pub pressure: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<f64>>,
}

impl TimeSeries {
    /// Drop the temperature column.
    pub fn pressure_series(&self) -> PressureSeries {
        PressureSeries {
            time: self.time.clone(),
            pressure: self.pressure.clone(),
        }
    }
}

/// Pressure at one location, resolved to "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureReading {
    pub location_id: String,
    /// RFC 3339 timestamp of the sample, with offset.
    pub timestamp: String,
    /// Mean sea-level pressure in hPa.
    pub pressure: f64,
    /// Air temperature at 2 m in °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
}
