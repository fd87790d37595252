use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::ApiError;
use crate::models::features::validate_coordinates;
use crate::services::resolver::LocationData;
use crate::startup::AppState;
use crate::weather::CurrentWeather;

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolved feature set for a coordinate pair. Never fails on weather
/// trouble; the body's `success`/`message` carry the degradation flag.
#[instrument(name = "HTTP: Location data", skip(state, query))]
pub async fn location_data_handler(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<LocationData>, ApiError> {
    validate_coordinates(query.latitude, query.longitude)?;

    let data = state
        .location_service
        .resolve(query.latitude, query.longitude)
        .await;

    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
    pub email: Option<String>,
}

/// Real-time conditions. Unlike resolution this surfaces upstream failure
/// to the caller. Identified fetches are appended to the weather log.
#[instrument(name = "HTTP: Current weather", skip(state, query))]
pub async fn weather_handler(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<CurrentWeather>, ApiError> {
    validate_coordinates(query.lat, query.lon)?;

    let weather = state
        .location_service
        .current_weather(query.lat, query.lon)
        .await
        .map_err(|e| {
            tracing::error!("Weather fetch failed: {:?}", e);
            ApiError::WeatherUnavailable
        })?;

    if let Some(email) = &query.email {
        state
            .location_service
            .log_fetch(email, query.lat, query.lon, &weather)
            .await;
    }

    Ok(Json(weather))
}
