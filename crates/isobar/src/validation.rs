//! Input validation for location payloads, settings and query parameters.
//!
//! Field checks return `Result<(), String>`; [`LocationCandidate::validate`]
//! runs all of them and reports every violation at once.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, FieldViolation};
use crate::model::{
    Location, LocationType, MAX_DASHBOARD_LOCATIONS, MAX_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS,
};

/// Validate a location id. Any non-blank string is accepted.
pub fn validate_location_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("Location ID is required".to_string());
    }
    Ok(())
}

/// Validate a required free-text field such as a name or code.
pub fn validate_label(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

pub fn validate_latitude(latitude: f64) -> Result<(), String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("Latitude must be between -90 and 90, got {}", latitude));
    }
    Ok(())
}

pub fn validate_longitude(longitude: f64) -> Result<(), String> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!(
            "Longitude must be between -180 and 180, got {}",
            longitude
        ));
    }
    Ok(())
}

pub fn validate_elevation(elevation: f64) -> Result<(), String> {
    if !elevation.is_finite() {
        return Err("Elevation must be a finite number of meters".to_string());
    }
    Ok(())
}

/// Validate the client refresh interval: an integer number of seconds in
/// `[60, 3600]`.
pub fn validate_refresh_interval(seconds: i64) -> Result<(), String> {
    if seconds < MIN_REFRESH_INTERVAL_SECS {
        return Err(format!(
            "apiRefreshInterval must be at least {} seconds",
            MIN_REFRESH_INTERVAL_SECS
        ));
    }
    if seconds > MAX_REFRESH_INTERVAL_SECS {
        return Err(format!(
            "apiRefreshInterval must be at most {} seconds",
            MAX_REFRESH_INTERVAL_SECS
        ));
    }
    Ok(())
}

/// Validate a dashboard id list against the cap and the known ids.
pub fn validate_dashboard_ids(ids: &[String], known: impl Fn(&str) -> bool) -> Result<(), String> {
    if ids.len() > MAX_DASHBOARD_LOCATIONS {
        return Err(format!(
            "Maximum {} dashboard locations allowed",
            MAX_DASHBOARD_LOCATIONS
        ));
    }
    let unknown: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| !known(id))
        .collect();
    if !unknown.is_empty() {
        return Err(format!("Invalid location IDs: {}", unknown.join(", ")));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::invalid(field, format!("expected YYYY-MM-DD, got '{}'", value)))
}

/// Parse and order-check a historical date range.
pub fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), Error> {
    match (parse_date("start", start), parse_date("end", end)) {
        (Ok(s), Ok(e)) if s <= e => Ok((s, e)),
        (Ok(_), Ok(_)) => Err(Error::invalid("start", "start date must not be after end date")),
        (start_result, end_result) => {
            let violations = [start_result.err(), end_result.err()]
                .into_iter()
                .flatten()
                .flat_map(|e| e.violations().to_vec())
                .collect();
            Err(Error::Validation(violations))
        }
    }
}

/// A location payload as received from a client, before validation.
///
/// Every field is optional so that missing fields and unknown `type` values
/// are reported as violations rather than decode failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationCandidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, rename = "type")]
    pub location_type: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

impl From<Location> for LocationCandidate {
    fn from(l: Location) -> Self {
        Self {
            id: Some(l.id),
            name: Some(l.name),
            code: Some(l.code),
            latitude: Some(l.latitude),
            longitude: Some(l.longitude),
            location_type: Some(l.location_type.as_str().to_string()),
            elevation: l.elevation,
        }
    }
}

impl LocationCandidate {
    /// Check every field and build a [`Location`], or return all violations.
    pub fn validate(self) -> Result<Location, Error> {
        let mut violations = Vec::new();
        let mut check = |field: &str, r: Result<(), String>| {
            if let Err(msg) = r {
                violations.push(FieldViolation::new(field, msg));
            }
        };

        match &self.id {
            Some(id) => check("id", validate_location_id(id)),
            None => check("id", Err("Location ID is required".to_string())),
        }
        check("name", validate_label("name", self.name.as_deref().unwrap_or("")));
        check("code", validate_label("code", self.code.as_deref().unwrap_or("")));
        match self.latitude {
            Some(lat) => check("latitude", validate_latitude(lat)),
            None => check("latitude", Err("Latitude is required".to_string())),
        }
        match self.longitude {
            Some(lon) => check("longitude", validate_longitude(lon)),
            None => check("longitude", Err("Longitude is required".to_string())),
        }
        let location_type = self.location_type.as_deref().and_then(LocationType::parse);
        if location_type.is_none() {
            check("type", Err("Type must be 'coast' or 'interior'".to_string()));
        }
        if let Some(elevation) = self.elevation {
            check("elevation", validate_elevation(elevation));
        }

        match (self.id, self.name, self.code, self.latitude, self.longitude, location_type) {
            (Some(id), Some(name), Some(code), Some(latitude), Some(longitude), Some(location_type))
                if violations.is_empty() =>
            {
                Ok(Location {
                    id,
                    name,
                    code,
                    latitude,
                    longitude,
                    location_type,
                    elevation: self.elevation,
                })
            }
            _ => Err(Error::Validation(violations)),
        }
    }
}
