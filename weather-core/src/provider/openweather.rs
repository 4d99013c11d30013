use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    Coordinates,
    model::{AirQuality, CurrentConditions, ForecastEntry},
    provider::get_json,
};

use super::WeatherSource;

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, http: Client) -> Self {
        Self::with_base_url(api_key, http, OPENWEATHER_BASE_URL)
    }

    pub fn with_base_url(api_key: String, http: Client, base_url: &str) -> Self {
        Self {
            api_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        coords: Coordinates,
        what: &str,
    ) -> Result<T> {
        let url = format!("{}/data/2.5/{}", self.base_url, endpoint);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        get_json(
            &self.http,
            &url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
            what,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwPollution {
    main: OwAqiMain,
    #[serde(default)]
    components: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct OwPollutionResponse {
    list: Vec<OwPollution>,
}

impl TryFrom<OwForecastEntry> for ForecastEntry {
    type Error = anyhow::Error;

    fn try_from(entry: OwForecastEntry) -> Result<Self> {
        let timestamp = unix_to_utc(entry.dt)
            .ok_or_else(|| anyhow!("OpenWeather forecast entry has invalid timestamp {}", entry.dt))?;

        let icon = entry
            .weather
            .into_iter()
            .next()
            .map(|w| w.icon)
            .ok_or_else(|| anyhow!("OpenWeather forecast entry at {} has no weather data", entry.dt))?;

        Ok(ForecastEntry {
            timestamp,
            temperature_c: entry.main.temp,
            humidity_pct: entry.main.humidity,
            icon,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, coords: Coordinates) -> Result<CurrentConditions> {
        let parsed: OwCurrentResponse = self
            .fetch("weather", coords, "OpenWeather (current weather)")
            .await?;

        let weather = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenWeather current response contained no weather data"))?;

        Ok(CurrentConditions {
            description: weather.description,
            icon: weather.icon,
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
        })
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastEntry>> {
        let parsed: OwForecastResponse = self
            .fetch("forecast", coords, "OpenWeather (5-day forecast)")
            .await?;

        parsed.list.into_iter().map(ForecastEntry::try_from).collect()
    }

    async fn air_quality(&self, coords: Coordinates) -> Result<AirQuality> {
        let parsed: OwPollutionResponse = self
            .fetch("air_pollution", coords, "OpenWeather (air pollution)")
            .await?;

        let first = parsed
            .list
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenWeather air pollution response contained no data"))?;

        Ok(AirQuality {
            index: first.main.aqi,
            components: first.components,
        })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http_client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LONDON: Coordinates = Coordinates { latitude: 51.5, longitude: -0.12 };

    fn client(server: &MockServer, timeout: Duration) -> OpenWeatherClient {
        let http = http_client(timeout).unwrap();
        OpenWeatherClient::with_base_url("OWM_KEY".into(), http, &server.uri())
    }

    #[tokio::test]
    async fn current_sends_metric_query_and_maps_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .and(query_param("appid", "OWM_KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": { "temp": 15.3, "humidity": 60, "pressure": 1012 },
                "weather": [{ "description": "light rain", "icon": "10d" }],
                "name": "London"
            })))
            .mount(&server)
            .await;

        let current = client(&server, Duration::from_secs(5))
            .current(LONDON)
            .await
            .unwrap();

        assert_eq!(current.description, "light rain");
        assert_eq!(current.icon, "10d");
        assert_eq!(current.temperature_c, 15.3);
        assert_eq!(current.humidity_pct, 60);
    }

    #[tokio::test]
    async fn current_without_weather_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": { "temp": 15.3, "humidity": 60 },
                "weather": []
            })))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .current(LONDON)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no weather data"));
    }

    #[tokio::test]
    async fn forecast_preserves_provider_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cnt": 2,
                "list": [
                    { "dt": 1_700_000_000, "main": { "temp": 10.4, "humidity": 70 }, "weather": [{ "icon": "01n" }] },
                    { "dt": 1_700_010_800, "main": { "temp": 11.6, "humidity": 65 }, "weather": [{ "icon": "02n" }] }
                ]
            })))
            .mount(&server)
            .await;

        let entries = client(&server, Duration::from_secs(5))
            .forecast(LONDON)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(entries[0].icon, "01n");
        assert_eq!(entries[1].temperature_c, 11.6);
        assert_eq!(entries[1].humidity_pct, 65);
    }

    #[tokio::test]
    async fn forecast_entry_without_icon_fails_whole_call() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    { "dt": 1_700_000_000, "main": { "temp": 10.4, "humidity": 70 }, "weather": [] }
                ]
            })))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .forecast(LONDON)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has no weather data"));
    }

    #[tokio::test]
    async fn air_quality_uses_first_list_element() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coord": { "lon": -0.12, "lat": 51.5 },
                "list": [
                    { "main": { "aqi": 2 }, "components": { "co": 201.94, "no2": 0.77, "pm2_5": 0.5 }, "dt": 1_700_000_000 },
                    { "main": { "aqi": 5 }, "components": {}, "dt": 1_700_003_600 }
                ]
            })))
            .mount(&server)
            .await;

        let aq = client(&server, Duration::from_secs(5))
            .air_quality(LONDON)
            .await
            .unwrap();

        assert_eq!(aq.index, 2);
        assert_eq!(aq.label(), "Fair");
        assert_eq!(aq.components.get("co"), Some(&201.94));
        assert_eq!(aq.components.len(), 3);
    }

    #[tokio::test]
    async fn empty_air_quality_list_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [] })))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .air_quality(LONDON)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("contained no data"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .forecast(LONDON)
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({
                        "main": { "temp": 1.0, "humidity": 1 },
                        "weather": [{ "description": "x", "icon": "01d" }]
                    })),
            )
            .mount(&server)
            .await;

        let result = client(&server, Duration::from_millis(50)).current(LONDON).await;
        assert!(result.is_err());
    }
}
