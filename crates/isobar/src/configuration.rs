//! Validated CRUD over locations and settings.
//!
//! Each operation runs as a single store transaction, so a failed call never
//! leaves a partial change behind.

use std::sync::Arc;

use crate::error::{Error, FieldViolation, Result};
use crate::model::{Location, LocationDocument, Settings, SettingsUpdate, MAX_LOCATIONS};
use crate::store::LocationStore;
use crate::validation::{self, LocationCandidate};

#[derive(Clone)]
pub struct ConfigurationApi {
    store: Arc<LocationStore>,
}

impl ConfigurationApi {
    pub fn new(store: Arc<LocationStore>) -> Self {
        Self { store }
    }

    /// All locations in display order plus the current settings.
    pub async fn list_locations(&self) -> Result<LocationDocument> {
        self.store.snapshot().await
    }

    /// Append a new location.
    ///
    /// A full store is reported as a capacity error before the payload is
    /// looked at.
    pub async fn add_location(&self, candidate: LocationCandidate) -> Result<Location> {
        let location = self
            .store
            .transact(move |doc| {
                if doc.locations.len() >= MAX_LOCATIONS {
                    return Err(Error::Capacity(format!(
                        "Maximum of {} locations allowed",
                        MAX_LOCATIONS
                    )));
                }
                let location = candidate.validate()?;
                if doc.contains(&location.id) {
                    return Err(Error::DuplicateId(location.id));
                }
                doc.locations.push(location.clone());
                Ok(location)
            })
            .await?;

        log::info!("[config] added location '{}' ({})", location.id, location.name);
        Ok(location)
    }

    /// Replace an existing location, keeping its position in display order.
    pub async fn update_location(&self, candidate: LocationCandidate) -> Result<Location> {
        let location = candidate.validate()?;
        let location = self
            .store
            .transact(move |doc| {
                let index = doc
                    .position(&location.id)
                    .ok_or_else(|| Error::NotFound(format!("Location '{}' not found", location.id)))?;
                doc.locations[index] = location.clone();
                Ok(location)
            })
            .await?;

        log::info!("[config] updated location '{}'", location.id);
        Ok(location)
    }

    /// Remove a location and drop it from the dashboard list.
    ///
    /// The home location can never be removed.
    pub async fn delete_location(&self, id: Option<&str>) -> Result<()> {
        let id = match id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(Error::invalid("id", "Location ID is required")),
        };

        self.store
            .transact(|doc| {
                if doc.settings.home_location_id == id {
                    return Err(Error::HomeLocationProtected(id.clone()));
                }
                let index = doc
                    .position(&id)
                    .ok_or_else(|| Error::NotFound(format!("Location '{}' not found", id)))?;
                doc.locations.remove(index);
                doc.settings.dashboard_location_ids.retain(|d| *d != id);
                Ok(())
            })
            .await?;

        log::info!("[config] deleted location '{}'", id);
        Ok(())
    }

    /// Apply a partial settings update.
    ///
    /// The home id is checked first; dashboard and interval problems are then
    /// reported together. Nothing is committed unless every supplied field
    /// passes.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
        let settings = self
            .store
            .transact(move |doc| {
                if let Some(home) = &update.home_location_id {
                    if !doc.contains(home) {
                        return Err(Error::NotFound(format!("Location '{}' not found", home)));
                    }
                }

                let mut violations = Vec::new();
                if let Some(ids) = &update.dashboard_location_ids {
                    if let Err(msg) = validation::validate_dashboard_ids(ids, |id| doc.contains(id)) {
                        violations.push(FieldViolation::new("dashboardLocationIds", msg));
                    }
                }
                let interval = match update.api_refresh_interval {
                    Some(secs) => match validation::validate_refresh_interval(secs) {
                        Ok(()) => u32::try_from(secs).ok(),
                        Err(msg) => {
                            violations.push(FieldViolation::new("apiRefreshInterval", msg));
                            None
                        }
                    },
                    None => None,
                };
                if !violations.is_empty() {
                    return Err(Error::Validation(violations));
                }

                if let Some(home) = update.home_location_id {
                    doc.settings.home_location_id = home;
                }
                if let Some(ids) = update.dashboard_location_ids {
                    doc.settings.dashboard_location_ids = ids;
                }
                if let Some(secs) = interval {
                    doc.settings.api_refresh_interval = secs;
                }
                Ok(doc.settings.clone())
            })
            .await?;

        log::info!(
            "[config] settings now home='{}' dashboard={:?} refresh={}s",
            settings.home_location_id,
            settings.dashboard_location_ids,
            settings.api_refresh_interval
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::LocationType;
    use crate::stations::seed_document;
    use crate::store::{DocumentPersistence, MemoryPersistence};

    fn api_with(doc: Option<LocationDocument>) -> (Arc<MemoryPersistence>, ConfigurationApi) {
        let persistence = Arc::new(match doc {
            Some(doc) => MemoryPersistence::with_document(doc),
            None => MemoryPersistence::new(),
        });
        let store = LocationStore::open(persistence.clone()).unwrap();
        (persistence, ConfigurationApi::new(Arc::new(store)))
    }

    fn candidate(id: &str) -> LocationCandidate {
        LocationCandidate {
            id: Some(id.to_string()),
            name: Some("Catalina".to_string()),
            code: Some("AVX".to_string()),
            latitude: Some(33.405),
            longitude: Some(-118.416),
            location_type: Some("coast".to_string()),
            elevation: Some(488.0),
        }
    }

    fn stored(persistence: &MemoryPersistence) -> LocationDocument {
        persistence.load().unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_add_location_appends() {
        let (persistence, api) = api_with(None);
        let added = api.add_location(candidate("avx")).await.unwrap();
        assert_eq!(added.location_type, LocationType::Coast);

        let doc = stored(&persistence);
        assert_eq!(doc.locations.len(), 25);
        assert_eq!(doc.locations.last().unwrap().id, "avx");
    }

    #[tokio::test]
    async fn test_add_location_duplicate_id() {
        let (persistence, api) = api_with(None);
        let err = api.add_location(candidate("sna")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_add_location_invalid_payload() {
        let (persistence, api) = api_with(None);
        let mut c = candidate("avx");
        c.location_type = Some("island".to_string());
        c.latitude = Some(-91.0);
        let err = api.add_location(c).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.violations().len(), 2);
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_add_location_capacity_wins_over_bad_payload() {
        let (persistence, api) = api_with(None);
        api.add_location(candidate("avx")).await.unwrap();
        let full = stored(&persistence);

        let err = api.add_location(candidate("sna")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        let err = api.add_location(LocationCandidate::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert_eq!(err.to_string(), "Maximum of 25 locations allowed");
        assert_eq!(stored(&persistence), full);
    }

    #[tokio::test]
    async fn test_update_location_replaces_in_place() {
        let (persistence, api) = api_with(None);
        let mut c = LocationCandidate::from(seed_document().locations[3].clone());
        c.name = Some("Barstow-Daggett".to_string());
        api.update_location(c).await.unwrap();

        let doc = stored(&persistence);
        assert_eq!(doc.locations[3].id, "dag");
        assert_eq!(doc.locations[3].name, "Barstow-Daggett");
        assert_eq!(doc.locations.len(), 24);
    }

    #[tokio::test]
    async fn test_update_location_unknown_id() {
        let (_, api) = api_with(None);
        let err = api.update_location(candidate("avx")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_location_prunes_dashboard() {
        let (persistence, api) = api_with(None);
        api.delete_location(Some("dag")).await.unwrap();

        let doc = stored(&persistence);
        assert!(!doc.contains("dag"));
        assert_eq!(doc.settings.dashboard_location_ids, vec!["las"]);
    }

    #[tokio::test]
    async fn test_delete_home_location_is_protected() {
        let (persistence, api) = api_with(None);
        let err = api.delete_location(Some("sna")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HomeLocationProtected);
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_delete_location_errors() {
        let (_, api) = api_with(None);
        assert_eq!(
            api.delete_location(Some("zzz")).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(api.delete_location(None).await.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            api.delete_location(Some("  ")).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn test_update_settings_applies_supplied_fields_only() {
        let (persistence, api) = api_with(None);
        let settings = api
            .update_settings(SettingsUpdate {
                home_location_id: Some("lax".to_string()),
                api_refresh_interval: Some(600),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(settings.home_location_id, "lax");
        assert_eq!(settings.api_refresh_interval, 600);
        assert_eq!(settings.dashboard_location_ids, vec!["dag", "las"]);
        assert_eq!(stored(&persistence).settings, settings);
    }

    #[tokio::test]
    async fn test_update_settings_too_many_dashboard_ids() {
        let (persistence, api) = api_with(None);
        let err = api
            .update_settings(SettingsUpdate {
                dashboard_location_ids: Some(vec![
                    "dag".into(),
                    "las".into(),
                    "psp".into(),
                    "bur".into(),
                ]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_update_settings_is_all_or_nothing() {
        let (persistence, api) = api_with(None);
        let err = api
            .update_settings(SettingsUpdate {
                home_location_id: Some("lax".to_string()),
                dashboard_location_ids: Some(vec!["psp".into()]),
                api_refresh_interval: Some(30),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.violations()[0].field, "apiRefreshInterval");
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_update_settings_unknown_references() {
        let (_, api) = api_with(None);
        let err = api
            .update_settings(SettingsUpdate {
                home_location_id: Some("zzz".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = api
            .update_settings(SettingsUpdate {
                dashboard_location_ids: Some(vec!["dag".into(), "nope".into()]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Invalid location IDs: nope"));
    }

    #[tokio::test]
    async fn test_update_settings_empty_home_is_not_found() {
        let (persistence, api) = api_with(None);
        let err = api
            .update_settings(SettingsUpdate {
                home_location_id: Some(String::new()),
                api_refresh_interval: Some(600),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(stored(&persistence), seed_document());
    }

    #[tokio::test]
    async fn test_add_location_accepts_free_form_id() {
        let (persistence, api) = api_with(None);
        let mut c = candidate("palm.springs");
        c.name = Some("Palm Springs ".repeat(20));
        api.add_location(c).await.unwrap();
        assert!(stored(&persistence).contains("palm.springs"));
    }

    #[tokio::test]
    async fn test_update_settings_clears_dashboard() {
        let (_, api) = api_with(None);
        let settings = api
            .update_settings(SettingsUpdate {
                dashboard_location_ids: Some(vec![]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(settings.dashboard_location_ids.is_empty());
    }

    #[tokio::test]
    async fn test_list_reflects_latest_commit() {
        let mut doc = seed_document();
        doc.locations.truncate(3);
        doc.settings.dashboard_location_ids = vec!["sba".to_string()];
        let (_, api) = api_with(Some(doc));

        api.add_location(candidate("avx")).await.unwrap();
        let listed = api.list_locations().await.unwrap();
        let ids: Vec<&str> = listed.locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["sna", "sba", "smx", "avx"]);
    }
}
