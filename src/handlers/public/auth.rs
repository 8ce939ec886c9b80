use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create a user account and return a session token
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Value> {
    let mut field_errors = HashMap::new();
    if !payload.email.contains('@') {
        field_errors.insert("email".to_string(), "must be a valid email".to_string());
    }
    if payload.password.len() < 8 {
        field_errors.insert(
            "password".to_string(),
            "must be at least 8 characters".to_string(),
        );
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Invalid registration fields",
            Some(field_errors),
        ));
    }

    let pool = DatabaseManager::pool().await?;
    let email = payload.email.trim().to_lowercase();

    let existing: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let salt = auth::generate_salt();
    let hash = auth::hash_password(&payload.password, &salt);

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, password_salt) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&email)
    .bind(&hash)
    .bind(&salt)
    .fetch_one(&pool)
    .await?;

    let token = auth::generate_jwt(Claims::new(user.id, user.email.clone()))
        .map_err(|e| ApiError::internal_server_error(format!("token generation failed: {}", e)))?;

    Ok(ApiResponse::created(json!({
        "user": { "id": user.id, "email": user.email },
        "token": token,
    })))
}

/// POST /auth/login - authenticate and return a session token
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !auth::verify_password(&payload.password, &user.password_salt, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = auth::generate_jwt(Claims::new(user.id, user.email.clone()))
        .map_err(|e| ApiError::internal_server_error(format!("token generation failed: {}", e)))?;

    Ok(ApiResponse::success(json!({
        "user": { "id": user.id, "email": user.email },
        "token": token,
    })))
}
