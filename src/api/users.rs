//! Account endpoints.
//!
//! Registration and email verification are public; everything else sits
//! behind the bearer-token middleware.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, RegisterRequest, VerifyEmailRequest};
use crate::services::{PublicUser, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Auth(msg) => Self::unauthorized(msg),
            UserError::NotFound => Self::NotFound(err.to_string()),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Registers an unverified account and sends the verification email.
///
/// # Endpoint
/// `POST /api/users`
///
/// # Errors
/// Returns a 400 naming the first credential rule that failed.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = state
        .user_service()
        .register(&payload.username, &payload.password, &payload.email)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// Consumes a verification token.
///
/// # Endpoint
/// `POST /api/users/verify-email`
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = state.user_service().verify_email(&payload.token).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let users = state.user_service().get_all().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    validate_id("user", id)?;

    let user = state.user_service().get_one(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_id("user", id)?;

    state.user_service().delete(id).await?;
    Ok(Json(ApiResponse::success(())))
}
