//! Open-Meteo geocoding and forecast client.

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{secs, WeatherConfig};
use crate::gateway::{ensure_success, GatewayError, SourceError};
use crate::models::{CurrentConditions, DailyForecast, Location, WeatherReport};
use crate::normalize::lenient;
use crate::utils::HttpClient;

const SOURCE_ID: &str = "open-meteo";

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,surface_pressure";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max,wind_speed_10m_max";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodingResponse {
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodingResult {
    #[serde(deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurrentBlock {
    #[serde(deserialize_with = "lenient::string")]
    time: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    temperature_2m: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    relative_humidity_2m: Option<f64>,
    #[serde(deserialize_with = "lenient::integer")]
    weather_code: Option<i64>,
    #[serde(deserialize_with = "lenient::float")]
    wind_speed_10m: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    surface_pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailyBlock {
    time: Vec<String>,
    #[serde(deserialize_with = "lenient::float_list")]
    weather_code: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::float_list")]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::float_list")]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::float_list")]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::float_list")]
    wind_speed_10m_max: Vec<Option<f64>>,
}

fn nth(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

impl DailyBlock {
    fn into_forecast(self) -> Vec<DailyForecast> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, date)| DailyForecast {
                date: date.clone(),
                weather_code: nth(&self.weather_code, i).map(|c| c as i64),
                temperature_max: nth(&self.temperature_2m_max, i),
                temperature_min: nth(&self.temperature_2m_min, i),
                precipitation_probability: nth(&self.precipitation_probability_max, i),
                wind_speed_max: nth(&self.wind_speed_10m_max, i),
            })
            .collect()
    }
}

/// Weather client backed by the Open-Meteo public API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: HttpClient,
    geocoding_url: String,
    forecast_url: String,
    timeout: std::time::Duration,
}

impl WeatherClient {
    pub fn new(http: HttpClient, config: &WeatherConfig) -> Self {
        Self {
            http,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            timeout: secs(config.timeout_secs),
        }
    }

    /// Resolve a city name to coordinates; `Ok(None)` when nothing matches
    pub async fn geocode(&self, city: &str) -> Result<Option<Location>, SourceError> {
        debug!(city, "Geocoding city");
        let response = self
            .http
            .get(&self.geocoding_url)
            .query(&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")])
            .timeout(self.timeout)
            .send()
            .await?;
        let data: GeocodingResponse = ensure_success(response).await?.json().await?;

        Ok(data.results.into_iter().next().and_then(|hit| {
            Some(Location {
                name: hit.name.unwrap_or_else(|| title_case(city)),
                country: hit.country,
                latitude: hit.latitude?,
                longitude: hit.longitude?,
            })
        }))
    }

    async fn forecast(&self, location: &Location, days: u8) -> Result<ForecastResponse, SourceError> {
        let response = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("forecast_days", days.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// Current conditions plus `days` of daily forecast for a city.
    ///
    /// An unknown city is a validation error; upstream failures are reported
    /// against Open-Meteo.
    pub async fn report(&self, city: &str, days: u8) -> Result<WeatherReport, GatewayError> {
        info!(city, days, "Fetching weather");

        let location = self
            .geocode(city)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?
            .ok_or_else(|| GatewayError::validation(format!("city '{}' not found", city)))?;

        let data = self
            .forecast(&location, days)
            .await
            .map_err(|e| GatewayError::upstream(SOURCE_ID, e))?;

        Ok(WeatherReport {
            city: location.name,
            country: location.country,
            latitude: location.latitude,
            longitude: location.longitude,
            observed_at: data.current.time.as_deref().map(format_observation_time),
            current: CurrentConditions {
                temperature: data.current.temperature_2m,
                humidity: data.current.relative_humidity_2m,
                weather_code: data.current.weather_code,
                wind_speed: data.current.wind_speed_10m,
                pressure: data.current.surface_pressure,
            },
            forecast: data.daily.into_forecast(),
            source: SOURCE_ID.to_string(),
        })
    }
}

/// `2024-05-01T14:15` becomes `2024-05-01 14:15`; anything else is kept as-is
fn format_observation_time(raw: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn client(server: &mockito::Server) -> WeatherClient {
        let config = WeatherConfig {
            geocoding_url: format!("{}/v1/search", server.url()),
            forecast_url: format!("{}/v1/forecast", server.url()),
            timeout_secs: 5,
        };
        WeatherClient::new(HttpClient::new(Duration::from_secs(5)).unwrap(), &config)
    }

    #[tokio::test]
    async fn test_report_maps_forecast() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "paris".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"name":"Paris","country":"France","latitude":48.85,"longitude":2.35}]}"#)
            .create_async()
            .await;
        let forecast = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("forecast_days".into(), "7".into()),
                Matcher::UrlEncoded("timezone".into(), "auto".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "current": {"time": "2024-05-01T14:15", "temperature_2m": 18.4, "relative_humidity_2m": 55,
                                "weather_code": 2, "wind_speed_10m": 3.2, "surface_pressure": 1012.6},
                    "daily": {"time": ["2024-05-01", "2024-05-02"],
                              "weather_code": [2, 61],
                              "temperature_2m_max": [20.1, 17.0],
                              "temperature_2m_min": [11.2, 10.4],
                              "precipitation_probability_max": [null, 80],
                              "wind_speed_10m_max": [4.0, 6.5]}
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let report = client(&server).report("paris", 7).await.unwrap();
        forecast.assert_async().await;

        assert_eq!(report.city, "Paris");
        assert_eq!(report.observed_at.as_deref(), Some("2024-05-01 14:15"));
        assert_eq!(report.current.weather_code, Some(2));
        assert_eq!(report.forecast.len(), 2);
        assert_eq!(report.forecast[0].precipitation_probability, None);
        assert_eq!(report.forecast[1].weather_code, Some(61));
    }

    #[tokio::test]
    async fn test_unknown_city_is_validation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(r#"{"generationtime_ms": 0.5}"#)
            .create_async()
            .await;
        let forecast = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client(&server).report("Atlantis", 1).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        forecast.assert_async().await;
    }

    #[tokio::test]
    async fn test_geocoder_outage_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let err = client(&server).report("Paris", 1).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream { ref source_id, error: SourceError::Status { status: 502, .. } } if source_id == "open-meteo"
        ));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new  york"), "New York");
        assert_eq!(title_case("москва"), "Москва");
    }
}
