use crate::models::prediction::PredictionRecord;
use sqlx::{Pool, Postgres};
use tracing::instrument;
use uuid::Uuid;

/// Append-only prediction history.
#[derive(Clone, Debug)]
pub struct PredictionRepository {
    pool: Pool<Postgres>,
}

impl PredictionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[instrument(name = "Saving prediction record", skip(self, input))]
    pub async fn save(
        &self,
        user_email: &str,
        input: serde_json::Value,
        crop: &str,
        confidence: Option<f64>,
    ) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO predictions (user_email, input, crop, confidence) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user_email)
        .bind(input)
        .bind(crop)
        .bind(confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    #[instrument(name = "Fetching prediction history", skip(self))]
    pub async fn list_by_user(
        &self,
        user_email: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<PredictionRecord>> {
        let records = sqlx::query_as::<_, PredictionRecord>(
            r#"SELECT id, user_email, input, crop, confidence, predicted_at
            FROM predictions
            WHERE user_email = $1
            ORDER BY predicted_at DESC
            LIMIT $2"#,
        )
        .bind(user_email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Append-only log of weather fetches.
#[derive(Clone, Debug)]
pub struct WeatherLogRepository {
    pool: Pool<Postgres>,
}

impl WeatherLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[instrument(name = "Appending weather log", skip(self, payload))]
    pub async fn append(
        &self,
        user_email: &str,
        latitude: f64,
        longitude: f64,
        payload: serde_json::Value,
    ) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO weather_logs (user_email, latitude, longitude, payload) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user_email)
        .bind(latitude)
        .bind(longitude)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weather_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
