//! Auth API Handlers
//!
//! Registration, login and the current-user endpoint. Login failures return
//! the same message whether the email exists or the password is wrong, so
//! the endpoint cannot be used to enumerate accounts.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::models::User;
use crate::db::repository::user;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let password_hash = hash_password(&req.password)?;
    let user = user::create(&state.pool, &req.name, &req.email, &password_hash).await?;

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = user.id, email = %user.email, "User registered");
    Ok(Json(LoginResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = user::find_by_email(&state.pool, &req.email).await?;

    // Same error for unknown email and wrong password
    let Some(user) = user else {
        tracing::warn!(email = %req.email, "Login failed - user not found");
        return Err(AppError::validation("Invalid email or password"));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "Login failed - invalid credentials");
        return Err(AppError::validation("Invalid email or password"));
    }

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = user.id, email = %user.email, "User logged in");
    Ok(Json(LoginResponse { token, user }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<ServerState>, user: CurrentUser) -> AppResult<Json<User>> {
    let user = user::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User no longer exists"))?;
    Ok(Json(user))
}
