use maud::{Markup, html};
use weather_core::{AirQuality, DailyPoint, HourlyPoint, ViewModel};

use super::base;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

/// The single page: search form, then either the error banner or the results.
pub fn weather_page(view: &ViewModel) -> Markup {
    base("Weather Forecast", content(view))
}

fn content(view: &ViewModel) -> Markup {
    html! {
        form class="search" action="/weather" method="post" {
            input type="text" name="city" placeholder="Enter city name" required autocomplete="off";
            button type="submit" { "Get Weather" }
        }

        @if let Some(error) = &view.error {
            div class="error" role="alert" { (error) }
        }

        @if let Some(message) = &view.message {
            section class="current" {
                h2 { (message) }
                @if let Some(icon) = &view.current_icon {
                    img src=(icon_url(icon)) alt="current conditions";
                }
                @if let Some(temperature) = &view.current_temperature {
                    p class="temperature" { "Temperature: " (temperature) }
                }
                @if let Some(humidity) = &view.current_humidity {
                    p class="humidity" { "Humidity: " (humidity) }
                }
            }
        }

        @if !view.hourly.is_empty() {
            (hourly_section(&view.hourly))
        }

        @if !view.daily.is_empty() {
            (daily_section(&view.daily))
        }

        @if let Some(air_quality) = &view.air_quality {
            (air_quality_section(air_quality))
        }
    }
}

fn hourly_section(hourly: &[HourlyPoint]) -> Markup {
    html! {
        section class="hourly" {
            h2 { "Hourly Forecast" }
            div class="cards" {
                @for point in hourly {
                    div class="card" {
                        p class="time" { (point.local_time) }
                        img src=(icon_url(&point.icon)) alt="forecast icon";
                        p { (point.temperature_c) "°C" }
                        p { (point.humidity_pct) "%" }
                    }
                }
            }
        }
    }
}

fn daily_section(daily: &[DailyPoint]) -> Markup {
    html! {
        section class="daily" {
            h2 { "5-Day Forecast" }
            div class="cards" {
                @for point in daily {
                    div class="card" {
                        p class="date" { (point.local_date) }
                        img src=(icon_url(&point.icon)) alt="forecast icon";
                        p { (point.temperature_c) "°C" }
                        p { (point.humidity_pct) "%" }
                    }
                }
            }
        }
    }
}

fn air_quality_section(air_quality: &AirQuality) -> Markup {
    html! {
        section class="air-quality" {
            h2 { "Air Quality" }
            p class={ "aqi aqi-" (air_quality.index) } {
                "AQI: " (air_quality.index) " (" (air_quality.label()) ")"
            }
            @if !air_quality.components.is_empty() {
                table {
                    thead {
                        tr {
                            th { "Pollutant" }
                            th { "μg/m³" }
                        }
                    }
                    tbody {
                        @for (name, value) in &air_quality.components {
                            tr {
                                td { (name) }
                                td { (value) }
                            }
                        }
                    }
                }
            }
        }
    }
}
