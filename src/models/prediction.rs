use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One row of prediction history. Immutable once written.
#[derive(Debug, FromRow, Serialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub user_email: String,
    pub input: serde_json::Value,
    pub crop: String,
    pub confidence: Option<f64>,
    pub predicted_at: DateTime<Utc>,
}

