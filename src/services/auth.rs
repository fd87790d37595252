use crate::{errors::ApiError, models::user::UserModel, store::user::UserRepository};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct AuthService {
    repo: UserRepository,
}

impl AuthService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Duplicate emails are rejected before hashing. The stored record never
    /// leaves this layer with its hash attached.
    #[instrument(name = "AuthService: Register", skip(self, password), fields(user_email = %email))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let existing = self.repo.find_by_email(email).await.map_err(|e| {
            tracing::error!("Database error during registration: {:?}", e);
            ApiError::Internal
        })?;
        if existing.is_some() {
            tracing::warn!("Registration rejected: email already registered");
            return Err(ApiError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| ApiError::Internal)?
            .to_string();

        self.repo.create_user(name, email, &hash).await.map_err(|e| {
            tracing::error!("Failed to store new user: {:?}", e);
            ApiError::Internal
        })?;

        tracing::info!("User registered");
        Ok(())
    }

    /// One failure path for both unknown email and wrong password, so the
    /// response cannot be used to enumerate accounts.
    #[instrument(
        name = "AuthService: Login attempt",
        skip(self, password),
        fields(user_email = %email)
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserModel, ApiError> {
        let user = self.repo.find_by_email(email).await.map_err(|e| {
            tracing::error!("Database error during login: {:?}", e);
            ApiError::Internal
        })?;

        let user = match user {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: user not found");
                return Err(ApiError::WrongCredentials);
            }
        };

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Critical: failed to parse password hash from DB: {:?}", e);
            ApiError::Internal
        })?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Login failed: invalid password provided");
            return Err(ApiError::WrongCredentials);
        }

        if let Err(e) = self.repo.touch_last_login(user.id).await {
            // A stale last_login is not worth failing an otherwise valid login.
            tracing::warn!("Failed to update last_login: {:?}", e);
        }

        tracing::info!("User authenticated successfully");
        Ok(user)
    }

    /// Lookup by email for `/auth/users/me`. Unlike login this distinguishes
    /// the unknown-user case with a 404.
    #[instrument(name = "AuthService: Current user lookup", skip(self))]
    pub async fn current_user(&self, email: &str) -> Result<UserModel, ApiError> {
        let user = self.repo.find_by_email(email).await.map_err(|e| {
            tracing::error!("Database error during user lookup: {:?}", e);
            ApiError::Internal
        })?;
        user.ok_or(ApiError::UserNotFound)
    }

    pub async fn user_count(&self) -> anyhow::Result<i64> {
        self.repo.count().await
    }
}
