//! Isobar tracks sea-level pressure differences between a home station and
//! a few comparison stations, and classifies each difference as onshore,
//! neutral or offshore flow.

pub mod api;
pub mod config;
pub mod configuration;
pub mod dashboard;
pub mod error;
pub mod gradient;
pub mod model;
pub mod pressure;
pub mod stations;
pub mod store;
pub mod validation;

pub use configuration::ConfigurationApi;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{Error, ErrorKind, FieldViolation, Result};
pub use gradient::{FlowBand, InterpretedGradient, PressureGradient};
pub use model::{Location, LocationDocument, LocationType, PressureReading, Settings};
pub use pressure::{ForecastProvider, OpenMeteoClient, PressureSource};
pub use store::LocationStore;
