use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{ItemDto, ItemError, ItemInput};

impl From<ItemError> for ApiError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::NotFound(id) => Self::not_found("Item", id),
            ItemError::Validation(msg) => Self::validation(msg),
            ItemError::Conflict(msg) => Self::Conflict(msg),
            ItemError::Database(msg) => Self::DatabaseError(msg),
            ItemError::Internal(msg) => Self::internal(msg),
        }
    }
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ItemDto>>>, ApiError> {
    let items = state.item_service().list().await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ItemDto>>, ApiError> {
    validate_id("item", id)?;

    let item = state.item_service().get(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// `POST /api/items`
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ItemInput>,
) -> Result<Json<ApiResponse<ItemDto>>, ApiError> {
    let item = state.item_service().create(payload).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// `PUT /api/items/{id}`
///
/// Full replacement; omitted fields fall back to their defaults and are
/// validated like a create.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ItemInput>,
) -> Result<Json<ApiResponse<ItemDto>>, ApiError> {
    validate_id("item", id)?;

    let item = state.item_service().update(id, payload).await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_id("item", id)?;

    state.item_service().delete(id).await?;
    Ok(Json(ApiResponse::success(())))
}
