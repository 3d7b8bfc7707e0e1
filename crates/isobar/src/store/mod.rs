//! Location store
//!
//! Owns the persisted [`LocationDocument`]. Every mutation goes through
//! [`LocationStore::transact`]: load, apply, re-check the document invariants,
//! then save. Writers are serialized; a failed mutation leaves the stored
//! document untouched.

pub mod persistence;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, FieldViolation, Result};
use crate::model::{LocationDocument, MAX_LOCATIONS};
use crate::validation::{self, LocationCandidate};

pub use persistence::{
    default_document_path, get_isobar_home, DocumentPersistence, JsonFilePersistence,
    MemoryPersistence, PersistenceError,
};

pub struct LocationStore {
    persistence: Arc<dyn DocumentPersistence>,
    write_lock: Mutex<()>,
}

impl LocationStore {
    /// Open the store, writing the seed document if nothing is stored yet.
    ///
    /// A stored document that violates the document invariants is refused
    /// with a persistence error rather than served.
    pub fn open(persistence: Arc<dyn DocumentPersistence>) -> Result<Self> {
        match persistence.load()? {
            Some(doc) => {
                let violations = check_document(&doc);
                if !violations.is_empty() {
                    return Err(corrupt(&violations).into());
                }
                log::info!(
                    "[store] loaded {} locations, home '{}'",
                    doc.locations.len(),
                    doc.settings.home_location_id
                );
            }
            None => {
                let doc = crate::stations::seed_document();
                persistence.save(&doc)?;
                log::info!("[store] seeded {} default locations", doc.locations.len());
            }
        }

        Ok(Self {
            persistence,
            write_lock: Mutex::new(()),
        })
    }

    /// Latest committed document.
    pub async fn snapshot(&self) -> Result<LocationDocument> {
        self.load().await
    }

    /// Apply `mutate` to a working copy of the document and commit it.
    ///
    /// Nothing is written when `mutate` fails or the result breaks an
    /// invariant.
    pub async fn transact<T>(
        &self,
        mutate: impl FnOnce(&mut LocationDocument) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.load().await?;
        let out = mutate(&mut doc)?;

        let violations = check_document(&doc);
        if !violations.is_empty() {
            log::warn!("[store] rejected mutation: {}", Error::Validation(violations.clone()));
            return Err(Error::Validation(violations));
        }

        let persistence = self.persistence.clone();
        tokio::task::spawn_blocking(move || persistence.save(&doc))
            .await
            .map_err(PersistenceError::from)??;
        Ok(out)
    }

    /// Storage backends do blocking I/O, so they run off the async workers.
    async fn load(&self) -> Result<LocationDocument> {
        let persistence = self.persistence.clone();
        let loaded = tokio::task::spawn_blocking(move || persistence.load())
            .await
            .map_err(PersistenceError::from)??;
        match loaded {
            Some(doc) => Ok(doc),
            None => Err(PersistenceError::Corrupt("document is missing".to_string()).into()),
        }
    }
}

fn corrupt(violations: &[FieldViolation]) -> PersistenceError {
    let summary = violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    PersistenceError::Corrupt(summary)
}

/// Every invariant the stored document must satisfy. Empty when consistent.
pub fn check_document(doc: &LocationDocument) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if doc.locations.len() > MAX_LOCATIONS {
        violations.push(FieldViolation::new(
            "locations",
            format!("Maximum of {} locations allowed", MAX_LOCATIONS),
        ));
    }

    let mut seen = HashSet::new();
    for location in &doc.locations {
        if !seen.insert(location.id.as_str()) {
            violations.push(FieldViolation::new(
                "locations",
                format!("duplicate location id '{}'", location.id),
            ));
        }
        if let Err(e) = LocationCandidate::from(location.clone()).validate() {
            violations.extend(e.violations().iter().map(|v| {
                FieldViolation::new(format!("locations[{}].{}", location.id, v.field), v.message.clone())
            }));
        }
    }

    if !doc.contains(&doc.settings.home_location_id) {
        violations.push(FieldViolation::new(
            "homeLocationId",
            format!("'{}' is not a known location", doc.settings.home_location_id),
        ));
    }

    if let Err(msg) =
        validation::validate_dashboard_ids(&doc.settings.dashboard_location_ids, |id| doc.contains(id))
    {
        violations.push(FieldViolation::new("dashboardLocationIds", msg));
    }

    if let Err(msg) = validation::validate_refresh_interval(i64::from(doc.settings.api_refresh_interval)) {
        violations.push(FieldViolation::new("apiRefreshInterval", msg));
    }

    violations
}
