use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub description: String,
    pub icon: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Provider AQI on a 1 (good) to 5 (very poor) scale.
    pub index: u8,
    /// Pollutant concentrations in μg/m³, keyed by provider name ("pm2_5", "no2", ...).
    pub components: BTreeMap<String, f64>,
}

impl AirQuality {
    pub fn label(&self) -> &'static str {
        match self.index {
            1 => "Good",
            2 => "Fair",
            3 => "Moderate",
            4 => "Poor",
            5 => "Very Poor",
            _ => "Unknown",
        }
    }
}

/// One raw point of the provider's forecast series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Local time, "HH:MM" 24-hour.
    pub local_time: String,
    pub temperature_c: i32,
    pub humidity_pct: u8,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Local date, "DD/MM/YYYY".
    pub local_date: String,
    pub temperature_c: i32,
    pub humidity_pct: u8,
    pub icon: String,
}
