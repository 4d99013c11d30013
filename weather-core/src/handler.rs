use chrono_tz::Tz;
use log::{debug, error, info};

use crate::{
    Config, FetchError, ViewModel,
    forecast::{to_daily, to_hourly},
    provider::{Geocoder, WeatherSource, geocoder_from_config, weather_source_from_config},
};

/// Progress of a single request, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Geocoding,
    FetchingWeather,
    Rendered,
    Failed,
}

/// Turns a city name into a [`ViewModel`]: geocode, fetch, shape.
///
/// Holds no per-request state; one instance serves every request.
pub struct RequestHandler {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
    timezone: Tz,
}

impl RequestHandler {
    pub fn new(geocoder: Box<dyn Geocoder>, weather: Box<dyn WeatherSource>, timezone: Tz) -> Self {
        Self { geocoder, weather, timezone }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            geocoder_from_config(config)?,
            weather_source_from_config(config)?,
            config.timezone()?,
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub async fn handle(&self, city: &str) -> ViewModel {
        let mut stage = Stage::Idle;
        advance(city, &mut stage, Stage::Geocoding);

        let coords = match self.geocoder.resolve(city).await {
            Ok(coords) => coords,
            Err(FetchError::NotFound(_)) => {
                info!("City not found: '{}'", city);
                advance(city, &mut stage, Stage::Failed);
                return ViewModel::city_not_found();
            }
            Err(FetchError::Upstream(e)) => {
                error!("Geocoding failed for '{}': {:#}", city, e);
                advance(city, &mut stage, Stage::Failed);
                return ViewModel::upstream_error();
            }
        };

        advance(city, &mut stage, Stage::FetchingWeather);

        let fetched = tokio::try_join!(
            self.weather.current(coords),
            self.weather.forecast(coords),
            self.weather.air_quality(coords),
        );

        let (current, forecast, air_quality) = match fetched {
            Ok(results) => results,
            Err(e) => {
                error!("Weather API error for '{}': {:#}", city, e);
                advance(city, &mut stage, Stage::Failed);
                return ViewModel::upstream_error();
            }
        };

        let view = ViewModel::populated(
            city,
            &current,
            to_hourly(&forecast, self.timezone),
            to_daily(&forecast, self.timezone),
            air_quality,
        );

        advance(city, &mut stage, Stage::Rendered);
        view
    }
}

fn advance(city: &str, stage: &mut Stage, next: Stage) {
    debug!("[{}] {:?} -> {:?}", city, stage, next);
    *stage = next;
}
