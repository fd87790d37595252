use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Range violation or malformed field. Carries the offending field so
    /// clients can highlight it.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Email already registered")]
    EmailTaken,

    /// One message for both unknown email and wrong password.
    #[error("Wrong credentials")]
    WrongCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Weather data unavailable")]
    WeatherUnavailable,

    #[error("{0}")]
    BadRequest(String),

    #[error("Storage error")]
    Storage(anyhow::Error),

    #[error("Internal server error")]
    Internal,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "field": field }),
            ),
            ApiError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Email already registered. Please use a different email or login." }),
            ),
            ApiError::WrongCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid email or password. Please check your credentials." }),
            ),
            ApiError::UserNotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": "User not found" }))
            }
            ApiError::WeatherUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Weather data unavailable" }),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error. Please try again." }),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "An unexpected error occurred" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
