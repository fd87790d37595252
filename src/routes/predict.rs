use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::errors::ApiError;
use crate::models::features::{FeatureOverrides, FeatureVector, validate_coordinates};
use crate::startup::AppState;

/// Fallback coordinates when a caller asks for auto-fetched weather without
/// saying where it is (center of India, as the original clients assume).
pub const DEFAULT_LAT: f64 = 20.5937;
pub const DEFAULT_LON: f64 = 78.9629;

/// Per-field hard defaults used when resolution produces nothing.
const FALLBACK_FEATURES: FeatureVector = FeatureVector {
    nitrogen: 50.0,
    phosphorus: 50.0,
    potassium: 50.0,
    temperature: 25.0,
    humidity: 70.0,
    ph: 6.5,
    rainfall: 100.0,
    ozone: 30.0,
};

#[derive(Debug, Deserialize)]
pub struct ManualCropInput {
    #[serde(flatten)]
    pub features: FeatureVector,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationCropInput {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub overrides: FeatureOverrides,
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CropPredictionResponse {
    pub success: bool,
    pub crop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub input_values: serde_json::Value,
    pub message: String,
}

#[instrument(name = "HTTP: Manual crop prediction", skip(state, input))]
pub async fn manual_predict_handler(
    State(state): State<AppState>,
    Json(input): Json<ManualCropInput>,
) -> Result<Json<CropPredictionResponse>, ApiError> {
    input.features.validate()?;

    let outcome = state
        .prediction_service
        .recommend_crop(&input.features, "manual input");

    let input_values = serde_json::to_value(input.features).unwrap_or_default();

    if outcome.success {
        if let Some(email) = &input.user_email {
            state
                .prediction_service
                .record(email, input_values.clone(), &outcome.crop, outcome.confidence)
                .await;
        }
    }

    Ok(Json(CropPredictionResponse {
        success: outcome.success,
        crop: outcome.crop,
        confidence: outcome.confidence,
        input_values,
        message: outcome.message,
    }))
}

/// Location-based prediction: resolve what the user left blank, let every
/// user-supplied value win, then dispatch.
#[instrument(
    name = "HTTP: Location crop prediction",
    skip(state, input),
    fields(latitude = input.latitude, longitude = input.longitude)
)]
pub async fn location_predict_handler(
    State(state): State<AppState>,
    Json(input): Json<LocationCropInput>,
) -> Result<Json<CropPredictionResponse>, ApiError> {
    validate_coordinates(input.latitude, input.longitude)?;
    input.overrides.validate()?;

    let fallback = if input.overrides.is_complete() {
        // nothing to resolve; the hard defaults are never read
        FALLBACK_FEATURES
    } else {
        state
            .location_service
            .resolve(input.latitude, input.longitude)
            .await
            .features()
    };

    let features = input.overrides.merge(&fallback);
    let outcome = state.prediction_service.recommend_crop(&features, "location");

    let mut input_values = serde_json::to_value(features).unwrap_or_default();
    if let Some(map) = input_values.as_object_mut() {
        map.insert("latitude".to_string(), json!(input.latitude));
        map.insert("longitude".to_string(), json!(input.longitude));
    }

    if outcome.success {
        if let Some(email) = &input.user_email {
            state
                .prediction_service
                .record(email, input_values.clone(), &outcome.crop, outcome.confidence)
                .await;
        }
    }

    Ok(Json(CropPredictionResponse {
        success: outcome.success,
        crop: outcome.crop,
        confidence: outcome.confidence,
        input_values,
        message: outcome.message,
    }))
}

/// Query-string variant kept for older clients. No success envelope.
#[derive(Debug, Deserialize)]
pub struct RecommendCropQuery {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
    pub ozone: f64,
}

impl RecommendCropQuery {
    fn features(&self) -> FeatureVector {
        FeatureVector {
            nitrogen: self.n,
            phosphorus: self.p,
            potassium: self.k,
            temperature: self.temperature,
            humidity: self.humidity,
            ph: self.ph,
            rainfall: self.rainfall,
            ozone: self.ozone,
        }
    }
}

#[instrument(name = "HTTP: Recommend crop (query)", skip(state, query))]
pub async fn recommend_crop_handler(
    State(state): State<AppState>,
    Query(query): Query<RecommendCropQuery>,
) -> impl IntoResponse {
    match state.prediction_service.crop_label(&query.features()) {
        Ok(label) => Json(json!({ "recommended_crop": label })),
        Err(e) => Json(json!({
            "recommended_crop": null,
            "message": format!("Prediction error: {e}"),
        })),
    }
}

/// Lenient JSON body: absent fields are zero, matching the original's
/// dictionary access.
#[derive(Debug, Deserialize)]
pub struct LenientCropInput {
    #[serde(rename = "N", default)]
    pub n: f64,
    #[serde(rename = "P", default)]
    pub p: f64,
    #[serde(rename = "K", default)]
    pub k: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub ph: f64,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default)]
    pub ozone: f64,
}

#[instrument(name = "HTTP: Recommend crop (api)", skip(state, input))]
pub async fn crop_recommend_handler(
    State(state): State<AppState>,
    Json(input): Json<LenientCropInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let features = FeatureVector {
        nitrogen: input.n,
        phosphorus: input.p,
        potassium: input.k,
        temperature: input.temperature,
        humidity: input.humidity,
        ph: input.ph,
        rainfall: input.rainfall,
        ozone: input.ozone,
    };

    let label = state
        .prediction_service
        .crop_label(&features)
        .map_err(|e| ApiError::BadRequest(format!("Prediction error: {e}")))?;

    Ok(Json(json!({ "crop": label })))
}

fn default_crop() -> String {
    "potato".to_string()
}

fn default_area() -> f64 {
    1.0
}

fn default_soil() -> f64 {
    0.5
}

fn default_ozone() -> f64 {
    40.0
}

#[derive(Debug, Deserialize)]
pub struct YieldInput {
    #[serde(default = "default_crop")]
    pub crop: String,
    #[serde(default = "default_area")]
    pub area: f64,
    #[serde(rename = "soilMoisture", default = "default_soil")]
    pub soil_moisture: f64,
    #[serde(default = "default_ozone")]
    pub ozone: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[instrument(name = "HTTP: Yield prediction", skip(state, input))]
pub async fn yield_predict_handler(
    State(state): State<AppState>,
    Json(input): Json<YieldInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut temp = input.temperature;
    let mut humidity = input.humidity;
    let mut rain = input.rainfall;

    if temp.is_none() || humidity.is_none() || rain.is_none() {
        let lat = input.lat.unwrap_or(DEFAULT_LAT);
        let lon = input.lon.unwrap_or(DEFAULT_LON);
        let weather = state
            .location_service
            .current_weather(lat, lon)
            .await
            .map_err(|_| ApiError::BadRequest("Weather data unavailable".to_string()))?;
        temp = temp.or(Some(weather.temp));
        humidity = humidity.or(Some(weather.humidity));
        rain = rain.or(Some(weather.rain));
    }

    let temp = temp.expect("temperature resolved above");
    let humidity = humidity.expect("humidity resolved above");
    let rain = rain.expect("rainfall resolved above");

    let value = match state
        .prediction_service
        .predict_yield(input.ozone, temp, rain, input.soil_moisture)
    {
        Ok(value) => round2(value),
        Err(e) => {
            // arithmetic fallback keeps the endpoint usable when the model is broken
            tracing::warn!("Yield model invocation failed, using fallback: {:?}", e);
            round2(input.area * (30.0 + temp * 0.5 + rain * 0.3))
        }
    };

    Ok(Json(json!({
        "yield": format!("{value} tonnes/hectare"),
        "value": value,
        "crop": input.crop,
        "area": input.area,
        "weather_used": {
            "temperature": temp,
            "humidity": humidity,
            "rainfall": rain,
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct LegacyYieldQuery {
    pub lat: f64,
    pub lon: f64,
    pub ozone: f64,
    pub soil: f64,
}

#[instrument(name = "HTTP: Yield prediction (query)", skip(state, query))]
pub async fn legacy_yield_handler(
    State(state): State<AppState>,
    Query(query): Query<LegacyYieldQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let weather = state
        .location_service
        .current_weather(query.lat, query.lon)
        .await
        .map_err(|_| ApiError::BadRequest("Weather data unavailable".to_string()))?;

    let value = state
        .prediction_service
        .predict_yield(query.ozone, weather.temp, weather.rain, query.soil)
        .map_err(|e| {
            tracing::error!("Yield model invocation failed: {:?}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "result": format!("Predicted Potato Yield: {value:.2} tonnes/hectare"),
    })))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
