//! Pressure readings from an hourly forecast provider.
//!
//! [`PressureSource`] turns a provider's hourly series into a single reading
//! for "now", fans out over several locations, and fetches archive ranges.
//! The provider itself sits behind [`ForecastProvider`] so tests can swap
//! in canned series.

pub mod open_meteo;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use futures::future::try_join_all;

use crate::error::{Error, Result};
use crate::model::{Location, PressureReading, PressureSeries, TimeSeries};
use crate::validation;

pub use open_meteo::OpenMeteoClient;

/// Which part of the provider's data to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesWindow {
    /// Today's hourly forecast, with temperature.
    Today,
    /// Archived observations over an inclusive date range.
    Archive { start: NaiveDate, end: NaiveDate },
}

/// Hourly samples as returned by a provider. Timestamps are local wall-clock
/// strings in `timezone`; `utc_offset_seconds` is used when the zone name is
/// absent or unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    pub utc_offset_seconds: i32,
    /// IANA zone name, e.g. `America/Los_Angeles`.
    pub timezone: Option<String>,
    pub time: Vec<String>,
    /// NaN where the provider had no value.
    pub pressure: Vec<f64>,
    pub temperature: Option<Vec<Option<f64>>>,
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch hourly samples for one location. Failures are reported as
    /// [`Error::UpstreamFetch`] naming the location.
    async fn hourly(&self, location: &Location, window: SeriesWindow) -> Result<HourlySeries>;
}

fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Qualify a provider timestamp with a fixed UTC offset.
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS` and full RFC 3339.
pub fn qualify_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    offset.from_local_datetime(&parse_local(raw)?).single()
}

/// Qualify a whole series of local timestamps.
///
/// With a known `zone` each timestamp gets the offset in force at that
/// instant, so a series spanning a DST switch stays monotonic. A repeated
/// wall-clock hour maps to its first occurrence unless that would not move
/// past the previous sample. Hours skipped by the zone, and every hour when
/// no zone is known, fall back to `offset`. Returns the first unparseable
/// timestamp on failure.
pub fn qualify_series<'a>(
    times: &'a [String],
    offset: FixedOffset,
    zone: Option<Tz>,
) -> std::result::Result<Vec<DateTime<FixedOffset>>, &'a str> {
    let mut qualified: Vec<DateTime<FixedOffset>> = Vec::with_capacity(times.len());
    for raw in times {
        let t = match (DateTime::parse_from_rfc3339(raw), zone) {
            (Ok(dt), _) => Some(dt),
            (Err(_), None) => qualify_timestamp(raw, offset),
            (Err(_), Some(zone)) => parse_local(raw).and_then(|naive| {
                match zone.from_local_datetime(&naive) {
                    LocalResult::Single(dt) => Some(dt.fixed_offset()),
                    LocalResult::Ambiguous(first, second) => {
                        let first = first.fixed_offset();
                        match qualified.last() {
                            Some(prev) if first <= *prev => Some(second.fixed_offset()),
                            _ => Some(first),
                        }
                    }
                    LocalResult::None => offset.from_local_datetime(&naive).single(),
                }
            }),
        };
        qualified.push(t.ok_or(raw.as_str())?);
    }
    Ok(qualified)
}

/// Index of the latest timestamp at or before `now`.
///
/// Scans in order and stops at the first timestamp after `now`. Falls back
/// to 0 when every timestamp is in the future or the list is empty.
pub fn resolve_current_index(times: &[DateTime<Utc>], now: DateTime<Utc>) -> usize {
    let mut current = 0;
    for (i, t) in times.iter().enumerate() {
        if *t <= now {
            current = i;
        } else {
            break;
        }
    }
    current
}

#[derive(Clone)]
pub struct PressureSource {
    provider: Arc<dyn ForecastProvider>,
    include_series: bool,
}

impl PressureSource {
    pub fn new(provider: Arc<dyn ForecastProvider>) -> Self {
        Self {
            provider,
            include_series: false,
        }
    }

    /// Attach the full forecast window to every reading.
    pub fn with_series(mut self, include_series: bool) -> Self {
        self.include_series = include_series;
        self
    }

    pub async fn fetch_reading(&self, location: &Location) -> Result<PressureReading> {
        self.fetch_reading_at(location, Utc::now()).await
    }

    /// Like [`fetch_reading`](Self::fetch_reading) with an explicit clock.
    pub async fn fetch_reading_at(
        &self,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<PressureReading> {
        let series = self.provider.hourly(location, SeriesWindow::Today).await?;
        let reading = reading_from_series(location, series, now, self.include_series)?;
        log::debug!(
            "[pressure] {} {:.1} hPa at {}",
            location.id,
            reading.pressure,
            reading.timestamp
        );
        Ok(reading)
    }

    /// Readings for every location, in input order. Any single failure fails
    /// the whole batch.
    pub async fn fetch_many_readings(&self, locations: &[Location]) -> Result<Vec<PressureReading>> {
        self.fetch_many_readings_at(locations, Utc::now()).await
    }

    pub async fn fetch_many_readings_at(
        &self,
        locations: &[Location],
        now: DateTime<Utc>,
    ) -> Result<Vec<PressureReading>> {
        try_join_all(locations.iter().map(|l| self.fetch_reading_at(l, now))).await
    }

    /// Archived hourly pressure between two `YYYY-MM-DD` dates, inclusive.
    /// The series is returned as the provider sent it.
    pub async fn fetch_historical_series(
        &self,
        location: &Location,
        start: &str,
        end: &str,
    ) -> Result<PressureSeries> {
        let (start, end) = validation::parse_date_range(start, end)?;
        let series = self
            .provider
            .hourly(location, SeriesWindow::Archive { start, end })
            .await?;
        Ok(PressureSeries {
            time: series.time,
            pressure: series.pressure,
        })
    }
}

fn reading_from_series(
    location: &Location,
    series: HourlySeries,
    now: DateTime<Utc>,
    include_series: bool,
) -> Result<PressureReading> {
    let offset = FixedOffset::east_opt(series.utc_offset_seconds).ok_or_else(|| {
        Error::upstream(
            &location.name,
            format!("invalid utc offset {}", series.utc_offset_seconds),
        )
    })?;

    let zone = series.timezone.as_deref().and_then(|name| name.parse::<Tz>().ok());
    let qualified = qualify_series(&series.time, offset, zone).map_err(|raw| {
        Error::upstream(&location.name, format!("invalid timestamp '{}'", raw))
    })?;
    let utc: Vec<DateTime<Utc>> = qualified.iter().map(|t| t.with_timezone(&Utc)).collect();

    let index = resolve_current_index(&utc, now);
    let (timestamp, pressure) = match (qualified.get(index), series.pressure.get(index)) {
        (Some(t), Some(p)) => (t.to_rfc3339(), *p),
        _ => {
            return Err(Error::upstream(
                &location.name,
                "response contained no hourly pressure samples",
            ))
        }
    };
    let temperature = series
        .temperature
        .as_ref()
        .and_then(|temps| temps.get(index).copied().flatten());

    let time_series = include_series.then(|| TimeSeries {
        time: series.time.clone(),
        pressure: series.pressure.clone(),
        temperature: series
            .temperature
            .as_ref()
            .map(|temps| temps.iter().map(|t| t.unwrap_or(f64::NAN)).collect()),
    });

    Ok(PressureReading {
        location_id: location.id.clone(),
        timestamp,
        pressure,
        temperature,
        time_series,
    })
}

/// Canned provider for tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockProvider {
        pub series: Mutex<HashMap<String, HourlySeries>>,
        pub failing: Mutex<Vec<String>>,
        pub calls: Mutex<Vec<(String, SeriesWindow)>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Constant pressure over a full UTC day starting 2024-01-01T00:00.
        pub fn with_constant(self, id: &str, pressure: f64) -> Self {
            let time = (0..24).map(|h| format!("2024-01-01T{:02}:00", h)).collect();
            self.with_series(
                id,
                HourlySeries {
                    utc_offset_seconds: 0,
                    timezone: None,
                    time,
                    pressure: vec![pressure; 24],
                    temperature: None,
                },
            )
        }

        pub fn with_series(self, id: &str, series: HourlySeries) -> Self {
            self.series.lock().unwrap().insert(id.to_string(), series);
            self
        }

        pub fn failing_for(self, id: &str) -> Self {
            self.failing.lock().unwrap().push(id.to_string());
            self
        }

        pub fn call_ids(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
        }
    }

    #[async_trait]
    impl ForecastProvider for MockProvider {
        async fn hourly(&self, location: &Location, window: SeriesWindow) -> Result<HourlySeries> {
            self.calls.lock().unwrap().push((location.id.clone(), window));
            if self.failing.lock().unwrap().contains(&location.id) {
                return Err(Error::upstream(&location.name, "503 Service Unavailable"));
            }
            self.series
                .lock()
                .unwrap()
                .get(&location.id)
                .cloned()
                .ok_or_else(|| Error::upstream(&location.name, "404 Not Found"))
        }
    }
}
