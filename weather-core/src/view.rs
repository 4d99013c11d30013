use crate::model::{AirQuality, CurrentConditions, DailyPoint, HourlyPoint};

pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found. Please enter a valid city.";
pub const UPSTREAM_ERROR_MESSAGE: &str = "Error fetching weather data. Please try again later.";

/// Everything the page template needs for one render.
///
/// A populated view has no `error`; an error view has no weather fields.
/// The blank form has neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub message: Option<String>,
    pub current_temperature: Option<String>,
    pub current_humidity: Option<String>,
    pub current_icon: Option<String>,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub air_quality: Option<AirQuality>,
    pub error: Option<String>,
}

impl ViewModel {
    /// The empty form.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn city_not_found() -> Self {
        Self::error(CITY_NOT_FOUND_MESSAGE)
    }

    pub fn upstream_error() -> Self {
        Self::error(UPSTREAM_ERROR_MESSAGE)
    }

    pub fn populated(
        city: &str,
        current: &CurrentConditions,
        hourly: Vec<HourlyPoint>,
        daily: Vec<DailyPoint>,
        air_quality: AirQuality,
    ) -> Self {
        Self {
            message: Some(format!("Weather in {}: {}", city, current.description)),
            current_temperature: Some(format!("{}°C", unsigned_zero(current.temperature_c))),
            current_humidity: Some(format!("{}%", current.humidity_pct)),
            current_icon: Some(current.icon.clone()),
            hourly,
            daily,
            air_quality: Some(air_quality),
            error: None,
        }
    }

    pub fn has_weather(&self) -> bool {
        self.message.is_some()
    }
}

/// Collapse `-0.0` to `0.0` so it prints as "0".
fn unsigned_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
