use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::menu::{CreateMenuItemRequest, MenuItemResponse};
use crate::ApiResponse;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MenuQuery {
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/menu",
    summary = "List available menu items",
    description = "Items currently orderable, optionally filtered by category",
    params(
        ("category" = Option<String>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "Menu items retrieved successfully", body = ApiResponse<Vec<MenuItemResponse>>),
    ),
    tag = "menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<ApiResponse<Vec<MenuItemResponse>>>, ServiceError> {
    let items = state.services.menu.list_available(query.category).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    summary = "Get menu item",
    description = "Resolves any item by id, including ones no longer available",
    params(
        ("id" = i64, Path, description = "Menu item ID"),
    ),
    responses(
        (status = 200, description = "Menu item retrieved successfully", body = ApiResponse<MenuItemResponse>),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state
        .services
        .menu
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Menu item with id {} not found", id)))?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu",
    summary = "Create menu item",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created successfully", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(request): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItemResponse>>), ServiceError> {
    let item = state.services.menu.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}
