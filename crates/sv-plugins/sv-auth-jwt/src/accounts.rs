//! Account lifecycle: register, login, refresh rotation, logout, profile.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sv_core::{AppError, IdentityProvider, Result, User, UserProfile, UserRepo};
use uuid::Uuid;

use crate::password::{hash_password, verify_password};
use crate::tokens::{token_digest, TokenIssuer, TokenPair};

pub const DEFAULT_AVATAR: &str = "https://cdn-icons-png.flaticon.com/512/149/149071.png";
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    tokens: TokenIssuer,
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials!".to_string())
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Session> {
        let (Some(username), Some(email), Some(password), Some(full_name)) = (
            required(&request.username),
            required(&request.email),
            required(&request.password),
            required(&request.full_name),
        ) else {
            return Err(AppError::ValidationError("All fields are required!".to_string()));
        };
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters!"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters!"
            )));
        }
        let email = email.to_lowercase();
        if !email.contains('@') {
            return Err(AppError::ValidationError("Email is invalid!".to_string()));
        }
        if self.users.is_taken(username, &email).await? {
            return Err(AppError::Conflict("User already exists!".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email,
            full_name: full_name.to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
            password_hash: hash_password(password.to_string()).await?,
            refresh_token_digest: None,
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        self.users.create_user(user).await?;

        let created = self.users.find_user(id).await?.ok_or_else(|| {
            tracing::error!(user_id = %id, "user written but read-back found nothing");
            AppError::Internal("Something went wrong while creating User!".to_string())
        })?;
        tracing::info!(user_id = %id, username = %created.username, "user registered");
        self.open_session(&created).await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        let (Some(login), Some(password)) = (required(&request.login), request.password.as_deref()) else {
            return Err(AppError::ValidationError("Login and password are required!".to_string()));
        };
        let user = self.users.find_by_login(login).await?.ok_or_else(invalid_credentials)?;
        if !verify_password(password.to_string(), user.password_hash.clone()).await {
            tracing::warn!(user_id = %user.id, "failed login attempt");
            return Err(invalid_credentials());
        }
        tracing::info!(user_id = %user.id, "user logged in");
        self.open_session(&user).await
    }

    /// Rotates the refresh token. A token that is not the current one is rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let rejected = || AppError::Unauthorized("Invalid or expired refresh token!".to_string());
        let user_id = self.tokens.verify_refresh(refresh_token).ok_or_else(rejected)?;
        let user = self.users.find_user(user_id).await?.ok_or_else(rejected)?;
        if user.refresh_token_digest.as_deref() != Some(token_digest(refresh_token).as_str()) {
            tracing::warn!(%user_id, "refresh token reuse or unknown token");
            return Err(rejected());
        }
        self.rotate(user_id).await
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.users.set_refresh_digest(user_id, None).await?;
        tracing::info!(%user_id, "user logged out");
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string(), user_id.to_string()))?;
        Ok(UserProfile::from(&user))
    }

    async fn open_session(&self, user: &User) -> Result<Session> {
        let tokens = self.rotate(user.id).await?;
        Ok(Session { user: UserProfile::from(user), tokens })
    }

    async fn rotate(&self, user_id: Uuid) -> Result<TokenPair> {
        let pair = self.tokens.issue(user_id)?;
        self.users
            .set_refresh_digest(user_id, Some(token_digest(&pair.refresh_token)))
            .await?;
        Ok(pair)
    }
}

#[async_trait]
impl IdentityProvider for AccountService {
    async fn authenticate(&self, access_token: &str) -> Result<Uuid> {
        let unauthorized = || AppError::Unauthorized("Unauthorized Access!".to_string());
        let user_id = self.tokens.verify_access(access_token).ok_or_else(unauthorized)?;
        // Tokens of deleted accounts stop working immediately.
        self.users.find_user(user_id).await?.ok_or_else(unauthorized)?;
        Ok(user_id)
    }
}
