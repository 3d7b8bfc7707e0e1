//! HTTP client for the Open-Meteo forecast and archive APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ForecastProvider, HourlySeries, SeriesWindow};
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::model::Location;

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Hourly block of an Open-Meteo response. Missing samples arrive as `null`.
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    pressure_msl: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    #[serde(default)]
    timezone: Option<String>,
    hourly: HourlyBlock,
}

/// Decode a forecast or archive response body.
pub fn parse_hourly(body: &str) -> std::result::Result<HourlySeries, String> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid response: {}", e))?;
    let hourly = response.hourly;
    if hourly.pressure_msl.len() != hourly.time.len() {
        return Err(format!(
            "hourly series is misaligned: {} timestamps, {} pressure samples",
            hourly.time.len(),
            hourly.pressure_msl.len()
        ));
    }

    Ok(HourlySeries {
        utc_offset_seconds: response.utc_offset_seconds,
        timezone: response.timezone,
        time: hourly.time,
        pressure: hourly
            .pressure_msl
            .into_iter()
            .map(|p| p.unwrap_or(f64::NAN))
            .collect(),
        temperature: hourly.temperature_2m,
    })
}

pub struct OpenMeteoClient {
    client: reqwest::Client,
    forecast_url: String,
    archive_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(config: &UpstreamConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("isobar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            timezone: config.timezone.clone(),
        })
    }

    fn request(&self, location: &Location, window: SeriesWindow) -> reqwest::RequestBuilder {
        let mut params = vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
        ];
        let url = match window {
            SeriesWindow::Today => {
                params.push(("hourly", "pressure_msl,temperature_2m".to_string()));
                params.push(("forecast_days", "1".to_string()));
                &self.forecast_url
            }
            SeriesWindow::Archive { start, end } => {
                params.push(("start_date", start.format("%Y-%m-%d").to_string()));
                params.push(("end_date", end.format("%Y-%m-%d").to_string()));
                params.push(("hourly", "pressure_msl".to_string()));
                &self.archive_url
            }
        };
        params.push(("timezone", self.timezone.clone()));
        self.client.get(url).query(&params)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn hourly(&self, location: &Location, window: SeriesWindow) -> Result<HourlySeries> {
        let resp = self.request(location, window).send().await.map_err(|e| {
            log::warn!("[open-meteo] request for {} failed: {}", location.id, e);
            Error::upstream(&location.name, e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("[open-meteo] {} returned {}", location.id, status);
            return Err(Error::upstream(&location.name, status.to_string()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::upstream(&location.name, e.to_string()))?;
        parse_hourly(&body).map_err(|msg| Error::upstream(&location.name, msg))
    }
}
