use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::ApiError;
use crate::models::user::{SessionUser, UserResponse};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[instrument(
    name = "HTTP: Register",
    skip(state, payload),
    fields(user_email = %payload.email)
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_register(&payload)?;

    state
        .auth_service
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!(
                "User '{}' registered successfully! Please login to continue.",
                payload.name
            ),
        }),
    ))
}

#[instrument(
    name = "HTTP: Login",
    skip(state, payload),
    fields(user_email = %payload.email)
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: SessionUser::from(&user),
    }))
}

/// Lookup by email. Returns 404 for unknown users, unlike login's uniform
/// 401 — kept as-is rather than silently changed.
#[instrument(name = "HTTP: Current user", skip(state))]
pub async fn current_user_handler(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.current_user(&query.email).await?;
    Ok(Json(user.into()))
}

fn validate_register(payload: &RegisterPayload) -> Result<(), ApiError> {
    let name_len = payload.name.chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(ApiError::Validation {
            field: "name".to_string(),
            message: "name must be between 2 and 100 characters".to_string(),
        });
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation {
            field: "email".to_string(),
            message: "email address is not valid".to_string(),
        });
    }
    let password_len = payload.password.chars().count();
    if !(6..=100).contains(&password_len) {
        return Err(ApiError::Validation {
            field: "password".to_string(),
            message: "password must be between 6 and 100 characters".to_string(),
        });
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn well_formed_registration_passes() {
        assert!(validate_register(&payload("John Doe", "john.doe@example.com", "test123456")).is_ok());
    }

    #[test]
    fn malformed_email_is_rejected_with_field_detail() {
        match validate_register(&payload("John Doe", "not-an-email", "test123456")) {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "email"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_register(&payload("John Doe", "john@example.com", "short")).is_err());
    }

    #[test]
    fn single_character_name_is_rejected() {
        assert!(validate_register(&payload("J", "john@example.com", "test123456")).is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@.co"));
    }
}
