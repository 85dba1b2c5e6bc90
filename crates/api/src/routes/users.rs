//! User registration and login endpoints.
//!
//! Tokens are issued but no route is gated by them; enforcement is the
//! frontend's concern in this deployment.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use store::{NewUser, RetailStore};

use crate::AppState;
use crate::auth;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

/// POST /register — create a user account.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn register<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password cannot be blank".to_string(),
        ));
    }
    if state
        .store
        .find_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    state
        .store
        .insert_user(NewUser {
            username: req.username,
            password_hash,
            role: req.role.unwrap_or_else(|| "user".to_string()),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User created successfully." })),
    ))
}

/// POST /login — verify credentials and issue a token.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn login<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let user = state.store.find_user_by_username(&req.username).await?;

    // Same response for unknown user and wrong password.
    let Some(user) = user.filter(|u| auth::verify_password(&req.password, &u.password_hash))
    else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid credentials" })),
        )
            .into_response());
    };

    let access_token = auth::create_token(user.id, &user.role, &state.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;

    Ok(Json(serde_json::json!({
        "access_token": access_token,
        "username": user.username,
        "role": user.role,
    }))
    .into_response())
}
