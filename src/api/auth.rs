use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::{LoginResult, PublicUser};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The user resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the configured authorization header to a user and stores it as a
/// [`CurrentUser`] request extension. Anything else is a 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_name = state.config().auth.authorization_header.as_str();
    let header_value = headers.get(header_name).and_then(|v| v.to_str().ok());

    let user = state
        .user_service()
        .get_by_authorization_header(header_value)
        .await
        .map_err(|e| match e {
            crate::services::UserError::NotFound => ApiError::unauthorized("Unknown user"),
            other => ApiError::from(other),
        })?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Exchange credentials of a verified user for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .user_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /users/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::success(user))
}
