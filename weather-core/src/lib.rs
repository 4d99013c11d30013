//! Core library for the city weather page.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and weather provider clients
//! - Forecast shaping into hourly and daily views
//! - The request handler that turns a city name into a view model
//!
//! It is used by `weather-web`, but carries no HTTP server or template code.

pub mod config;
pub mod error;
pub mod forecast;
pub mod handler;
pub mod model;
pub mod provider;
pub mod view;

pub use config::{Config, ProviderConfig};
pub use error::FetchError;
pub use handler::RequestHandler;
pub use model::{AirQuality, Coordinates, CurrentConditions, DailyPoint, ForecastEntry, HourlyPoint};
pub use provider::{Geocoder, ProviderId, WeatherSource};
pub use view::ViewModel;
