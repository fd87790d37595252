//! Open-Meteo client. One bounded timeout, no retry, no cache; every call
//! re-derives its values.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather payload has no current block")]
    MissingCurrent,
}

/// Current conditions, as served by `/api/weather` and consumed by the
/// advisory endpoints that auto-fetch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurrentWeather {
    pub temp: f64,
    pub humidity: f64,
    pub rain: f64,
    pub wind: f64,
}

/// The crop-resolution shape: current temperature/humidity plus a 7-day
/// mean of daily precipitation as rainfall.
#[derive(Debug, Clone, Copy)]
pub struct AgroWeather {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    current: Option<CurrentBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    windspeed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    precipitation_sum: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { http, base_url }
    }

    /// Weather inputs for crop resolution. Errors bubble up so the resolver
    /// can substitute its degraded defaults.
    #[instrument(name = "Weather: agronomic fetch", skip(self))]
    pub async fn agronomic(&self, latitude: f64, longitude: f64) -> Result<AgroWeather, WeatherError> {
        let payload: ForecastPayload = self
            .http
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,precipitation".to_string(),
                ),
                ("daily", "precipitation_sum".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(agro_from_payload(&payload))
    }

    /// Real-time conditions including wind. A payload without a current
    /// block is an error here, unlike the agronomic shape.
    #[instrument(name = "Weather: current fetch", skip(self))]
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, WeatherError> {
        let payload: ForecastPayload = self
            .http
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,precipitation,windspeed_10m".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        current_from_payload(&payload)
    }
}

fn agro_from_payload(payload: &ForecastPayload) -> AgroWeather {
    let (temperature, humidity) = match &payload.current {
        Some(current) => (
            current.temperature_2m.unwrap_or(25.0),
            current.relative_humidity_2m.unwrap_or(70.0),
        ),
        None => (25.0, 70.0),
    };

    let rainfall = match &payload.daily {
        Some(daily) if !daily.precipitation_sum.is_empty() => {
            let week: Vec<f64> = daily.precipitation_sum.iter().copied().take(7).collect();
            week.iter().sum::<f64>() / 7.0
        }
        _ => 100.0,
    };

    AgroWeather {
        temperature: round2(temperature),
        humidity: round2(humidity),
        rainfall: round2(rainfall),
    }
}

fn current_from_payload(payload: &ForecastPayload) -> Result<CurrentWeather, WeatherError> {
    let current = payload.current.as_ref().ok_or(WeatherError::MissingCurrent)?;
    Ok(CurrentWeather {
        temp: round2(current.temperature_2m.unwrap_or(0.0)),
        humidity: round2(current.relative_humidity_2m.unwrap_or(0.0)),
        rain: round2(current.precipitation.unwrap_or(0.0)),
        wind: round2(current.windspeed_10m.unwrap_or(0.0)),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agronomic_rainfall_is_the_weekly_mean() {
        let payload: ForecastPayload = serde_json::from_str(
            r#"{
                "current": {"temperature_2m": 21.4, "relative_humidity_2m": 64.0, "precipitation": 0.2},
                "daily": {"precipitation_sum": [7.0, 0.0, 14.0, 0.0, 7.0, 0.0, 7.0, 99.0]}
            }"#,
        )
        .unwrap();

        let weather = agro_from_payload(&payload);
        assert_eq!(weather.temperature, 21.4);
        assert_eq!(weather.humidity, 64.0);
        // only the first seven days count
        assert_eq!(weather.rainfall, 5.0);
    }

    #[test]
    fn agronomic_defaults_apply_per_missing_field() {
        let payload: ForecastPayload = serde_json::from_str(r#"{"current": {}}"#).unwrap();
        let weather = agro_from_payload(&payload);
        assert_eq!(weather.temperature, 25.0);
        assert_eq!(weather.humidity, 70.0);
        assert_eq!(weather.rainfall, 100.0);
    }

    #[test]
    fn current_requires_the_current_block() {
        let payload: ForecastPayload =
            serde_json::from_str(r#"{"daily": {"precipitation_sum": [1.0]}}"#).unwrap();
        assert!(matches!(
            current_from_payload(&payload),
            Err(WeatherError::MissingCurrent)
        ));
    }

    #[test]
    fn current_rounds_to_two_decimals() {
        let payload: ForecastPayload = serde_json::from_str(
            r#"{
                "current": {
                    "temperature_2m": 21.456,
                    "relative_humidity_2m": 63.999,
                    "precipitation": 0.125,
                    "windspeed_10m": 12.344
                }
            }"#,
        )
        .unwrap();
        let weather = current_from_payload(&payload).unwrap();
        assert_eq!(weather.temp, 21.46);
        assert_eq!(weather.humidity, 64.0);
        assert_eq!(weather.rain, 0.13);
        assert_eq!(weather.wind, 12.34);
    }
}
