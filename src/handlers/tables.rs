use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::tables::{CreateTableRequest, TableResponse};
use crate::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/v1/tables",
    summary = "List tables",
    description = "All dining tables with their occupancy status",
    responses(
        (status = 200, description = "Tables retrieved successfully", body = ApiResponse<Vec<TableResponse>>),
    ),
    tag = "tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TableResponse>>>, ServiceError> {
    let tables = state.services.tables.list_tables().await?;
    Ok(Json(ApiResponse::success(tables)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}",
    summary = "Get table",
    params(
        ("id" = i64, Path, description = "Table ID"),
    ),
    responses(
        (status = 200, description = "Table retrieved successfully", body = ApiResponse<TableResponse>),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    tag = "tables"
)]
pub async fn get_table(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TableResponse>>, ServiceError> {
    let table = state
        .services
        .tables
        .get_table(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Table with id {} not found", id)))?;
    Ok(Json(ApiResponse::success(table)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables",
    summary = "Create table",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created successfully", body = ApiResponse<TableResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    Json(request): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TableResponse>>), ServiceError> {
    let table = state.services.tables.create_table(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(table))))
}
