//! Dashboard queries: current gradients from home to the comparison set,
//! batch readings and archive history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::gradient::{compute_gradients, pair_comparisons, InterpretedGradient};
use crate::model::{Location, PressureReading, PressureSeries, MAX_DASHBOARD_LOCATIONS};
use crate::pressure::PressureSource;
use crate::store::LocationStore;

/// Everything a client needs to render one dashboard refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub home_location: Location,
    pub home_reading: PressureReading,
    pub gradients: Vec<InterpretedGradient>,
    /// Suggested seconds until the next refresh.
    pub refresh_interval: u32,
}

#[derive(Clone)]
pub struct Dashboard {
    store: Arc<LocationStore>,
    source: PressureSource,
}

impl Dashboard {
    pub fn new(store: Arc<LocationStore>, source: PressureSource) -> Self {
        Self { store, source }
    }

    pub async fn current_gradients(&self, compare: Option<Vec<String>>) -> Result<DashboardSnapshot> {
        self.current_gradients_at(compare, Utc::now()).await
    }

    /// Gradients from home to each comparison location.
    ///
    /// `compare` overrides the stored dashboard list; it is cut to the first
    /// three ids. Unknown ids are skipped. Home and comparison readings are
    /// fetched together and fail together.
    pub async fn current_gradients_at(
        &self,
        compare: Option<Vec<String>>,
        now: DateTime<Utc>,
    ) -> Result<DashboardSnapshot> {
        let doc = self.store.snapshot().await?;
        let home = doc
            .home_location()
            .cloned()
            .ok_or_else(|| Error::NotFound("Home location not found".to_string()))?;

        let mut ids = compare.unwrap_or_else(|| doc.settings.dashboard_location_ids.clone());
        ids.truncate(MAX_DASHBOARD_LOCATIONS);
        let comparisons: Vec<Location> = ids
            .iter()
            .filter_map(|id| {
                let found = doc.find(id).cloned();
                if found.is_none() {
                    log::debug!("[dashboard] skipping unknown location '{}'", id);
                }
                found
            })
            .collect();

        let mut batch = Vec::with_capacity(comparisons.len() + 1);
        batch.push(home.clone());
        batch.extend(comparisons.iter().cloned());
        let mut readings = self.source.fetch_many_readings_at(&batch, now).await?;
        if readings.is_empty() {
            return Err(Error::upstream(&home.name, "no reading returned"));
        }
        let home_reading = readings.remove(0);

        let pairs = pair_comparisons(comparisons, readings)?;
        let gradients = compute_gradients(&home, &home_reading, &pairs)
            .into_iter()
            .map(InterpretedGradient::from)
            .collect();

        Ok(DashboardSnapshot {
            home_location: home,
            home_reading,
            gradients,
            refresh_interval: doc.settings.api_refresh_interval,
        })
    }

    /// Current readings for the given ids, in request order. Unknown ids are
    /// dropped; at least one must resolve.
    pub async fn readings(&self, ids: &[String]) -> Result<Vec<PressureReading>> {
        let ids: Vec<&str> = ids
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(Error::invalid("ids", "No location IDs provided"));
        }

        let doc = self.store.snapshot().await?;
        let locations: Vec<Location> = ids.iter().filter_map(|id| doc.find(id).cloned()).collect();
        if locations.is_empty() {
            return Err(Error::NotFound("No valid locations found".to_string()));
        }

        self.source.fetch_many_readings(&locations).await
    }

    /// Archived hourly pressure for one location.
    pub async fn history(&self, id: &str, start: &str, end: &str) -> Result<PressureSeries> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::invalid("id", "Location ID is required"));
        }
        let doc = self.store.snapshot().await?;
        let location = doc
            .find(id)
            .ok_or_else(|| Error::NotFound(format!("Location '{}' not found", id)))?;
        self.source.fetch_historical_series(location, start, end).await
    }
}
