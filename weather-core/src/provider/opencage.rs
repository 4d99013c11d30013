use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::{Coordinates, FetchError, provider::get_json};

use super::Geocoder;

const OPENCAGE_BASE_URL: &str = "https://api.opencagedata.com";

/// Forward geocoding against the OpenCage API.
#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenCageGeocoder {
    pub fn new(api_key: String, http: Client) -> Self {
        Self::with_base_url(api_key, http, OPENCAGE_BASE_URL)
    }

    pub fn with_base_url(api_key: String, http: Client, base_url: &str) -> Self {
        Self {
            api_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OcGeometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OcResult {
    geometry: OcGeometry,
}

#[derive(Debug, Deserialize)]
struct OcResponse {
    results: Vec<OcResult>,
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn resolve(&self, city: &str) -> Result<Coordinates, FetchError> {
        let url = format!("{}/geocode/v1/json", self.base_url);

        let parsed: OcResponse = get_json(
            &self.http,
            &url,
            &[("q", city), ("key", self.api_key.as_str())],
            "OpenCage geocoding",
        )
        .await?;

        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(city.to_string()))?;

        debug!(
            "Geocoded '{}' to ({}, {})",
            city, first.geometry.lat, first.geometry.lng
        );

        Ok(Coordinates {
            latitude: first.geometry.lat,
            longitude: first.geometry.lng,
        })
    }
}
