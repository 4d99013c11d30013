use crate::{
    Config, Coordinates, FetchError,
    model::{AirQuality, CurrentConditions, ForecastEntry},
    provider::{opencage::OpenCageGeocoder, openweather::OpenWeatherClient},
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, time::Duration};

pub mod opencage;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenCage,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenCage => "opencage",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// Environment variable that overrides this provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenCage => crate::config::GEOCODING_API_KEY_ENV,
            ProviderId::OpenWeather => crate::config::WEATHER_API_KEY_ENV,
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenCage, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "opencage" => Ok(ProviderId::OpenCage),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: opencage, openweather."
            )),
        }
    }
}

/// Resolves a place name to coordinates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, city: &str) -> Result<Coordinates, FetchError>;
}

/// Current conditions, forecast and air quality for a point.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, coords: Coordinates) -> anyhow::Result<CurrentConditions>;

    async fn forecast(&self, coords: Coordinates) -> anyhow::Result<Vec<ForecastEntry>>;

    async fn air_quality(&self, coords: Coordinates) -> anyhow::Result<AirQuality>;
}

/// Construct the geocoder from config.
pub fn geocoder_from_config(config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    let id = ProviderId::OpenCage;
    let api_key = config.require_api_key(id)?.to_owned();
    let http = http_client(config.request_timeout())?;

    let geocoder = match config.provider_base_url(id) {
        Some(base) => OpenCageGeocoder::with_base_url(api_key, http, base),
        None => OpenCageGeocoder::new(api_key, http),
    };

    Ok(Box::new(geocoder))
}

/// Construct the weather source from config.
pub fn weather_source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let id = ProviderId::OpenWeather;
    let api_key = config.require_api_key(id)?.to_owned();
    let http = http_client(config.request_timeout())?;

    let client = match config.provider_base_url(id) {
        Some(base) => OpenWeatherClient::with_base_url(api_key, http, base),
        None => OpenWeatherClient::new(api_key, http),
    };

    Ok(Box::new(client))
}

/// HTTP client shared by a provider's calls. Every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` with `query`, require a 2xx status and decode the JSON body.
///
/// `what` names the call in error messages, e.g. "OpenWeather forecast".
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, &str)],
    what: &str,
) -> anyhow::Result<T> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
