//! Pressure gradients between the home station and its comparison stations,
//! and the qualitative flow band a gradient falls into.
//!
//! All functions here are pure. Sign convention: `difference = home - compare`,
//! so a positive value means higher pressure at home.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Location, PressureReading, PressureSeries};

/// Difference between the home station and one comparison station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureGradient {
    pub home_location: Location,
    pub compare_location: Location,
    pub home_pressure: f64,
    pub compare_pressure: f64,
    /// `home_pressure - compare_pressure`, in hPa.
    pub difference: f64,
    /// Taken from the home reading.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_time_series: Option<PressureSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_time_series: Option<PressureSeries>,
}

/// A comparison station paired with its reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub location: Location,
    pub reading: PressureReading,
}

impl Comparison {
    pub fn new(location: Location, reading: PressureReading) -> Self {
        Self { location, reading }
    }
}

/// Pair locations with readings index by index. Both slices must be the same
/// length.
pub fn pair_comparisons(
    locations: Vec<Location>,
    readings: Vec<PressureReading>,
) -> Result<Vec<Comparison>> {
    if locations.len() != readings.len() {
        return Err(Error::invalid(
            "readings",
            format!(
                "expected {} readings to match locations, got {}",
                locations.len(),
                readings.len()
            ),
        ));
    }
    Ok(locations
        .into_iter()
        .zip(readings)
        .map(|(location, reading)| Comparison::new(location, reading))
        .collect())
}

/// Compute the gradient from `home` to `compare`.
///
/// NaN pressures propagate into `difference` unchanged.
pub fn compute_gradient(
    home: &Location,
    home_reading: &PressureReading,
    compare: &Location,
    compare_reading: &PressureReading,
) -> PressureGradient {
    PressureGradient {
        home_location: home.clone(),
        compare_location: compare.clone(),
        home_pressure: home_reading.pressure,
        compare_pressure: compare_reading.pressure,
        difference: home_reading.pressure - compare_reading.pressure,
        timestamp: home_reading.timestamp.clone(),
        home_time_series: home_reading.time_series.as_ref().map(|s| s.pressure_series()),
        compare_time_series: compare_reading
            .time_series
            .as_ref()
            .map(|s| s.pressure_series()),
    }
}

/// One gradient per comparison, in input order.
pub fn compute_gradients(
    home: &Location,
    home_reading: &PressureReading,
    comparisons: &[Comparison],
) -> Vec<PressureGradient> {
    comparisons
        .iter()
        .map(|c| compute_gradient(home, home_reading, &c.location, &c.reading))
        .collect()
}

/// Qualitative flow regime implied by a gradient, strongest onshore first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowBand {
    StrongOnshore,
    ModerateOnshore,
    WeakOnshore,
    Neutral,
    WeakOffshore,
    ModerateOffshore,
    StrongOffshore,
}

impl FlowBand {
    /// Classify a difference in hPa.
    ///
    /// Boundaries: `> 5`, `> 2`, `> 0.5` onshore; `[-0.5, 0.5]` neutral;
    /// `>= -2`, `>= -5` offshore; anything else (including NaN) is strong
    /// offshore.
    pub fn classify(difference: f64) -> Self {
        if difference > 5.0 {
            FlowBand::StrongOnshore
        } else if difference > 2.0 {
            FlowBand::ModerateOnshore
        } else if difference > 0.5 {
            FlowBand::WeakOnshore
        } else if difference >= -0.5 {
            FlowBand::Neutral
        } else if difference >= -2.0 {
            FlowBand::WeakOffshore
        } else if difference >= -5.0 {
            FlowBand::ModerateOffshore
        } else {
            FlowBand::StrongOffshore
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlowBand::StrongOnshore => "Strong Onshore Flow",
            FlowBand::ModerateOnshore => "Moderate Onshore Flow",
            FlowBand::WeakOnshore => "Weak Onshore Flow",
            FlowBand::Neutral => "Neutral",
            FlowBand::WeakOffshore => "Weak Offshore Flow",
            FlowBand::ModerateOffshore => "Moderate Offshore Flow",
            FlowBand::StrongOffshore => "Strong Offshore Flow",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FlowBand::StrongOnshore => "High pressure over coast, strong gradient toward land",
            FlowBand::ModerateOnshore => "Moderate pressure gradient favoring onshore winds",
            FlowBand::WeakOnshore => "Slight pressure gradient toward land",
            FlowBand::Neutral => "Minimal pressure gradient",
            FlowBand::WeakOffshore => "Slight pressure gradient toward coast",
            FlowBand::ModerateOffshore => "Moderate pressure gradient favoring offshore winds",
            FlowBand::StrongOffshore => "High pressure over land, strong gradient toward coast",
        }
    }
}

impl std::fmt::Display for FlowBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// A gradient together with its classification, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedGradient {
    #[serde(flatten)]
    pub gradient: PressureGradient,
    pub band: FlowBand,
    pub label: String,
    pub description: String,
}

impl From<PressureGradient> for InterpretedGradient {
    fn from(gradient: PressureGradient) -> Self {
        let band = FlowBand::classify(gradient.difference);
        Self {
            gradient,
            band,
            label: band.label().to_string(),
            description: band.description().to_string(),
        }
    }
}

/// One decimal, e.g. `"1013.2 hPa"`.
pub fn format_pressure(hpa: f64) -> String {
    format!("{:.1} hPa", hpa)
}

/// Signed gradient with two decimals, e.g. `"+2.50 hPa"` or `"-0.75 hPa"`.
pub fn format_gradient(difference: f64) -> String {
    let sign = if difference >= 0.0 { "+" } else { "" };
    format!("{}{:.2} hPa", sign, difference)
}
