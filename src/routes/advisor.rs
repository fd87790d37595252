use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::ApiError;
use crate::routes::predict::{DEFAULT_LAT, DEFAULT_LON};
use crate::services::advisor::{fertilizer_advice, spray_advice, stress_assessment};
use crate::startup::AppState;

fn default_soil() -> f64 {
    0.5
}

fn default_ozone() -> f64 {
    40.0
}

fn default_crop() -> String {
    "potato".to_string()
}

/// Missing weather fields are auto-fetched; when the fetch itself fails the
/// advisors run on fixed defaults rather than failing the request.
async fn fill_weather(
    state: &AppState,
    lat: Option<f64>,
    lon: Option<f64>,
    temp: &mut Option<f64>,
    humidity: &mut Option<f64>,
    rainfall: &mut Option<f64>,
    wind: Option<&mut Option<f64>>,
) {
    let needs_wind = wind.as_ref().is_some_and(|w| w.is_none());
    if temp.is_some() && humidity.is_some() && rainfall.is_some() && !needs_wind {
        return;
    }

    let lat = lat.unwrap_or(DEFAULT_LAT);
    let lon = lon.unwrap_or(DEFAULT_LON);
    match state.location_service.current_weather(lat, lon).await {
        Ok(weather) => {
            temp.get_or_insert(weather.temp);
            humidity.get_or_insert(weather.humidity);
            rainfall.get_or_insert(weather.rain);
            if let Some(wind) = wind {
                wind.get_or_insert(weather.wind);
            }
        }
        Err(e) => {
            tracing::warn!("Weather fetch failed, advising on defaults: {:?}", e);
            temp.get_or_insert(25.0);
            humidity.get_or_insert(60.0);
            rainfall.get_or_insert(0.0);
            if let Some(wind) = wind {
                wind.get_or_insert(10.0);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FertilizerInput {
    #[serde(rename = "N", default)]
    pub n: f64,
    #[serde(rename = "P", default)]
    pub p: f64,
    #[serde(rename = "K", default)]
    pub k: f64,
    #[serde(default = "default_crop")]
    pub crop: String,
    #[serde(rename = "soilMoisture", default = "default_soil")]
    pub soil_moisture: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[instrument(name = "HTTP: Fertilizer advice", skip(state, input))]
pub async fn fertilizer_recommend_handler(
    State(state): State<AppState>,
    Json(input): Json<FertilizerInput>,
) -> Json<serde_json::Value> {
    let mut temp = input.temperature;
    let mut humidity = input.humidity;
    let mut rainfall = input.rainfall;
    fill_weather(
        &state,
        input.lat,
        input.lon,
        &mut temp,
        &mut humidity,
        &mut rainfall,
        None,
    )
    .await;

    let temp = temp.expect("temperature resolved above");
    let humidity = humidity.expect("humidity resolved above");
    let rainfall = rainfall.expect("rainfall resolved above");

    let advice = fertilizer_advice(
        input.n,
        input.p,
        input.k,
        temp,
        rainfall,
        input.soil_moisture,
    );

    Json(json!({
        "fertilizer": advice.fertilizers.join(", "),
        "recommendations": advice.recommendations,
        "npk_status": {
            "nitrogen": input.n,
            "phosphorus": input.p,
            "potassium": input.k,
        },
        "weather_used": {
            "temperature": temp,
            "humidity": humidity,
            "rainfall": rainfall,
            "soilMoisture": input.soil_moisture,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct StressInput {
    #[serde(rename = "soilMoisture", default = "default_soil")]
    pub soil_moisture: f64,
    #[serde(default = "default_ozone")]
    pub ozone: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    #[serde(rename = "windSpeed")]
    pub wind_speed: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[instrument(name = "HTTP: Stress assessment", skip(state, input))]
pub async fn stress_predict_handler(
    State(state): State<AppState>,
    Json(input): Json<StressInput>,
) -> Json<serde_json::Value> {
    let mut temp = input.temperature;
    let mut humidity = input.humidity;
    let mut rainfall = input.rainfall;
    let mut wind = input.wind_speed;
    fill_weather(
        &state,
        input.lat,
        input.lon,
        &mut temp,
        &mut humidity,
        &mut rainfall,
        Some(&mut wind),
    )
    .await;

    let temp = temp.expect("temperature resolved above");
    let humidity = humidity.expect("humidity resolved above");
    let rainfall = rainfall.expect("rainfall resolved above");
    let wind = wind.expect("wind resolved above");

    let assessment = stress_assessment(
        temp,
        humidity,
        input.soil_moisture,
        rainfall,
        wind,
        input.ozone,
    );

    Json(json!({
        "level": assessment.level,
        "factors": assessment.factors,
        "score": assessment.score,
        "weather_used": {
            "temperature": temp,
            "humidity": humidity,
            "rainfall": rainfall,
            "windSpeed": wind,
            "soilMoisture": input.soil_moisture,
            "ozone": input.ozone,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct SprayRequest {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "windSpeed")]
    pub wind_speed: f64,
    pub rainfall: f64,
    #[serde(rename = "timeOfDay", default)]
    pub time_of_day: String,
}

#[instrument(name = "HTTP: Spray window", skip(input))]
pub async fn spray_recommend_handler(Json(input): Json<SprayRequest>) -> Json<serde_json::Value> {
    let advice = spray_advice(
        input.temperature,
        input.humidity,
        input.wind_speed,
        input.rainfall,
        &input.time_of_day,
    );

    Json(json!({
        "is_safe": advice.is_safe,
        "recommendation": advice.recommendation,
        "best_time": advice.best_time,
        "factors": advice.factors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LegacyFertilizerQuery {
    pub lat: f64,
    pub lon: f64,
    pub ozone: f64,
    pub soil: f64,
    pub ph: f64,
    pub stage: String,
}

/// Model-backed fertilizer recommendation (query-string variant).
#[instrument(name = "HTTP: Fertilizer recommendation (query)", skip(state, query))]
pub async fn legacy_fertilizer_handler(
    State(state): State<AppState>,
    Query(query): Query<LegacyFertilizerQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let weather = state
        .location_service
        .current_weather(query.lat, query.lon)
        .await
        .map_err(|_| ApiError::BadRequest("Weather data unavailable".to_string()))?;

    let label = state
        .prediction_service
        .recommend_fertilizer(
            query.ozone,
            weather.temp,
            weather.rain,
            query.soil,
            query.ph,
            &query.stage,
        )
        .map_err(|e| {
            tracing::error!("Fertilizer model invocation failed: {:?}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "result": format!("Recommended Fertilizer: {label}"),
    })))
}

#[derive(Debug, Deserialize)]
pub struct LegacyStressQuery {
    // lat/lon are accepted for symmetry with the other legacy routes but the
    // caller supplies the ambient readings directly.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub ozone: f64,
    pub temp: f64,
    pub humidity: f64,
    pub color: String,
    pub symptom: String,
}

/// Model-backed stress level (query-string variant).
#[instrument(name = "HTTP: Stress prediction (query)", skip(state, query))]
pub async fn legacy_stress_handler(
    State(state): State<AppState>,
    Query(query): Query<LegacyStressQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (level, explanation) = state
        .prediction_service
        .predict_stress(
            query.ozone,
            query.temp,
            query.humidity,
            &query.color,
            &query.symptom,
        )
        .map_err(|e| {
            tracing::error!("Stress model invocation failed: {:?}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "result": format!("Stress Level: {level}"),
        "explanation": explanation,
    })))
}
