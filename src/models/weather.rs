//! Weather records.

use serde::Serialize;

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub weather_code: Option<i64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    pub weather_code: Option<i64>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Observation time as reported, local to the location
    pub observed_at: Option<String>,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
    pub source: String,
}

/// English description of a WMO weather interpretation code
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown conditions",
    }
}
