use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::ApiError;
use crate::models::prediction::PredictionRecord;
use crate::startup::AppState;

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Most recent prediction records for a user.
#[instrument(name = "HTTP: Prediction history", skip(state, query))]
pub async fn prediction_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let records = state.prediction_service.history(&query.email, limit).await?;
    Ok(Json(records))
}

/// Per-collection document counts.
#[instrument(name = "HTTP: Database stats", skip(state))]
pub async fn database_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users = state.auth_service.user_count().await?;
    let predictions = state.prediction_service.history_count().await?;
    let weather_logs = state.location_service.log_count().await?;

    Ok(Json(json!({
        "database": "smartagri",
        "collections": {
            "users": users,
            "predictions": predictions,
            "weather_logs": weather_logs,
        },
        "total_documents": users + predictions + weather_logs,
    })))
}
