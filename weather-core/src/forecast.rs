//! Reshapes the raw forecast series into the hourly and daily views shown on
//! the page. All local times and dates are taken in a single target timezone.

use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::model::{DailyPoint, ForecastEntry, HourlyPoint};

/// Number of forecast points in the hourly view.
pub const HOURLY_POINTS: usize = 8;

/// Maximum number of days in the daily view.
pub const DAILY_POINTS: usize = 5;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%d/%m/%Y";

/// The first [`HOURLY_POINTS`] entries, in provider order.
pub fn to_hourly(entries: &[ForecastEntry], tz: Tz) -> Vec<HourlyPoint> {
    entries
        .iter()
        .take(HOURLY_POINTS)
        .map(|entry| HourlyPoint {
            local_time: local_time(entry, tz),
            temperature_c: round_temperature(entry.temperature_c),
            humidity_pct: entry.humidity_pct,
            icon: entry.icon.clone(),
        })
        .collect()
}

/// One point per local calendar date, up to [`DAILY_POINTS`].
///
/// The first entry seen for a date represents the whole day; later entries
/// for that date are skipped, not aggregated.
pub fn to_daily(entries: &[ForecastEntry], tz: Tz) -> Vec<DailyPoint> {
    let mut seen = HashSet::new();
    let mut days = Vec::with_capacity(DAILY_POINTS);

    for entry in entries {
        if days.len() == DAILY_POINTS {
            break;
        }

        let date = local_date(entry, tz);
        if seen.insert(date.clone()) {
            days.push(DailyPoint {
                local_date: date,
                temperature_c: round_temperature(entry.temperature_c),
                humidity_pct: entry.humidity_pct,
                icon: entry.icon.clone(),
            });
        }
    }

    days
}

fn to_local(entry: &ForecastEntry, tz: Tz) -> DateTime<Tz> {
    entry.timestamp.with_timezone(&tz)
}

pub fn local_time(entry: &ForecastEntry, tz: Tz) -> String {
    to_local(entry, tz).format(TIME_FORMAT).to_string()
}

pub fn local_date(entry: &ForecastEntry, tz: Tz) -> String {
    to_local(entry, tz).format(DATE_FORMAT).to_string()
}

/// Nearest integer, halves towards positive infinity (2.5 -> 3, -2.5 -> -2).
pub fn round_temperature(celsius: f64) -> i32 {
    (celsius + 0.5).floor() as i32
}
