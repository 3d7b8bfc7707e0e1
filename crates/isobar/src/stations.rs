//! Built-in station table used to seed a fresh location document.
//!
//! Southern California coast and interior airports, plus a few desert
//! stations further inland that show offshore (Santa Ana) events well.

use crate::model::LocationType::{Coast, Interior};
use crate::model::{Location, LocationDocument, LocationType, Settings};

/// Static seed entry. Converted into an owned [`Location`] on first run.
#[derive(Debug, Clone, Copy)]
pub struct SeedStation {
    pub id: &'static str,
    pub name: &'static str,
    pub code: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
    pub elevation: f64,
}

impl SeedStation {
    pub fn to_location(&self) -> Location {
        Location {
            id: self.id.to_string(),
            name: self.name.to_string(),
            code: self.code.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_type: self.location_type,
            elevation: Some(self.elevation),
        }
    }
}

const fn station(
    id: &'static str,
    name: &'static str,
    code: &'static str,
    latitude: f64,
    longitude: f64,
    location_type: LocationType,
    elevation: f64,
) -> SeedStation {
    SeedStation {
        id,
        name,
        code,
        latitude,
        longitude,
        location_type,
        elevation,
    }
}

pub static SEED_STATIONS: &[SeedStation] = &[
    station("sna", "Santa Ana", "SNA", 33.6762, -117.8681, Coast, 17.0),
    station("sba", "Santa Barbara", "SBA", 34.4264, -119.8403, Coast, 3.0),
    station("smx", "Santa Maria", "SMX", 34.8989, -120.4573, Coast, 73.0),
    station("dag", "Barstow", "DAG", 34.8542, -116.7866, Interior, 585.0),
    station("las", "Las Vegas", "LAS", 36.084, -115.1537, Interior, 664.0),
    station("lax", "Los Angeles (LAX)", "LAX", 33.9416, -118.4085, Coast, 38.0),
    station("bur", "Burbank", "BUR", 34.2006, -118.359, Interior, 236.0),
    station("ont", "Ontario", "ONT", 34.056, -117.6012, Interior, 287.0),
    station("psp", "Palm Springs", "PSP", 33.8297, -116.5067, Interior, 145.0),
    station("san", "San Diego", "SAN", 32.7338, -117.1933, Coast, 9.0),
    station("crq", "Carlsbad", "CRQ", 33.1283, -117.28, Coast, 100.0),
    station("smo", "Santa Monica", "SMO", 34.0158, -118.4513, Coast, 53.0),
    station("vnr", "Van Nuys", "VNR", 34.2098, -118.4897, Interior, 244.0),
    station("oxr", "Oxnard", "OXR", 34.2008, -119.207, Coast, 13.0),
    station("bfl", "Bakersfield", "BFL", 35.4336, -119.0568, Interior, 150.0),
    station("sbp", "San Luis Obispo", "SBP", 35.2368, -120.6424, Coast, 65.0),
    station("vis", "Visalia", "VIS", 36.3186, -119.393, Interior, 90.0),
    station("ipx", "Indio/Thermal", "IPX", 33.6269, -116.16, Interior, -22.0),
    station("lbb", "Long Beach", "LBB", 33.8176, -118.1516, Coast, 18.0),
    station("riv", "Riverside", "RIV", 33.9519, -117.3962, Interior, 253.0),
    station("sbd", "San Bernardino", "SBD", 34.0953, -117.2352, Interior, 348.0),
    station("mry", "Monterey", "MRY", 36.5874, -121.843, Coast, 78.0),
    station("sjc", "San Jose", "SJC", 37.3639, -121.9289, Interior, 18.0),
    station("yum", "Yuma", "YUM", 32.6566, -114.606, Interior, 65.0),
];

pub const SEED_HOME_ID: &str = "sna";
pub const SEED_DASHBOARD_IDS: &[&str] = &["dag", "las"];

/// Find a seed station by id.
pub fn seed_station(id: &str) -> Option<&'static SeedStation> {
    SEED_STATIONS.iter().find(|s| s.id == id)
}

/// The document written when no configuration exists yet.
pub fn seed_document() -> LocationDocument {
    LocationDocument {
        locations: SEED_STATIONS.iter().map(SeedStation::to_location).collect(),
        settings: Settings {
            home_location_id: SEED_HOME_ID.to_string(),
            dashboard_location_ids: SEED_DASHBOARD_IDS.iter().map(|s| s.to_string()).collect(),
            api_refresh_interval: crate::model::DEFAULT_REFRESH_INTERVAL_SECS,
        },
    }
}
