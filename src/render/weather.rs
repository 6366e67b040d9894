//! Weather reports.

use std::fmt::Write as _;

use super::{measure, RULE};
use crate::models::{describe_weather_code, or_unknown, WeatherReport, UNKNOWN};

fn conditions(code: Option<i64>) -> &'static str {
    code.map(describe_weather_code).unwrap_or(UNKNOWN)
}

fn place(report: &WeatherReport) -> String {
    match &report.country {
        Some(country) => format!("{}, {}", report.city, country),
        None => report.city.clone(),
    }
}

/// Current conditions for one city
pub fn today(report: &WeatherReport) -> String {
    let current = &report.current;
    let mut out = String::new();
    let _ = writeln!(out, "Weather in {}", place(report));
    let _ = writeln!(out, "Observed: {}", or_unknown(&report.observed_at));
    let _ = writeln!(out, "Coordinates: {:.4}, {:.4}", report.latitude, report.longitude);
    let _ = writeln!(out);
    let _ = writeln!(out, "Conditions: {}", conditions(current.weather_code));
    let _ = writeln!(out, "Temperature: {}", measure(current.temperature, "°C"));
    let _ = writeln!(out, "Humidity: {}", measure(current.humidity, "%"));
    let _ = writeln!(out, "Wind: {}", measure(current.wind_speed, " m/s"));
    let _ = writeln!(out, "Pressure: {}", measure(current.pressure, " hPa"));
    let _ = write!(out, "\nSource: {}", report.source);
    out
}

/// Day-by-day forecast
pub fn weekly(report: &WeatherReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}-day forecast for {}", report.forecast.len(), place(report));

    if report.forecast.is_empty() {
        let _ = writeln!(out, "\nNo forecast data returned.");
    }

    for day in &report.forecast {
        let date = chrono::NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
            .map(|d| d.format("%a %d %b").to_string())
            .unwrap_or_else(|_| day.date.clone());
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "{}: {}", date, conditions(day.weather_code));
        let _ = writeln!(
            out,
            "  Temperature: {} / {}",
            measure(day.temperature_min, "°C"),
            measure(day.temperature_max, "°C")
        );
        let _ = writeln!(
            out,
            "  Precipitation chance: {}",
            measure(day.precipitation_probability, "%")
        );
        let _ = writeln!(out, "  Max wind: {}", measure(day.wind_speed_max, " m/s"));
    }

    let _ = write!(out, "\nSource: {}", report.source);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentConditions, DailyForecast};

    fn report() -> WeatherReport {
        WeatherReport {
            city: "Paris".into(),
            country: Some("France".into()),
            latitude: 48.85,
            longitude: 2.35,
            observed_at: None,
            current: CurrentConditions {
                temperature: Some(18.4),
                weather_code: Some(2),
                ..CurrentConditions::default()
            },
            forecast: vec![DailyForecast {
                date: "2024-05-01".into(),
                weather_code: Some(61),
                temperature_max: Some(20.0),
                temperature_min: Some(11.0),
                precipitation_probability: None,
                wind_speed_max: Some(4.0),
            }],
            source: "open-meteo".into(),
        }
    }

    #[test]
    fn test_today_marks_missing_fields() {
        let text = today(&report());
        assert!(text.contains("Weather in Paris, France"));
        assert!(text.contains("Conditions: Partly cloudy"));
        assert!(text.contains("Humidity: unknown"));
        assert!(text.contains("Observed: unknown"));
    }

    #[test]
    fn test_weekly_lists_days() {
        let text = weekly(&report());
        assert!(text.starts_with("1-day forecast for Paris, France"));
        assert!(text.contains("Wed 01 May: Slight rain"));
        assert!(text.contains("Precipitation chance: unknown"));
    }
}
