use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::config::PrinterConfig;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::handlers::AppState;
use crate::printing::{receipt, transport};
use crate::services::billing::{BillResponse, CloseOrderRequest, ClosedOrder};
use crate::ApiResponse;

/// Request to print a stored bill. With `preview` set the rendered text
/// comes back in the response instead of going to the printer.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PrintBillRequest {
    #[serde(default)]
    pub preview: bool,
    pub printer: Option<PrinterOverride>,
}

/// Per-request printer settings; unset fields fall back to configuration.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PrinterOverride {
    pub mode: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub device_path: Option<String>,
    pub printer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrintBillResponse {
    pub bill_id: i64,
    pub printed: bool,
    pub preview: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bills",
    summary = "Close an order",
    description = "Issues the bill, marks the order paid, and releases its table in one transaction. \
                   Closing an already-closed order returns the existing bill.",
    request_body = CloseOrderRequest,
    responses(
        (status = 201, description = "Bill issued", body = ApiResponse<ClosedOrder>),
        (status = 200, description = "Order was already closed; existing bill returned", body = ApiResponse<ClosedOrder>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "bills"
)]
pub async fn close_order(
    State(state): State<AppState>,
    Json(request): Json<CloseOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ClosedOrder>>), ServiceError> {
    let closed = state.services.billing.close_order(request).await?;
    let status = if closed.newly_issued {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(closed))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bills",
    summary = "List bills",
    description = "All issued bills, newest first",
    responses(
        (status = 200, description = "Bills retrieved successfully", body = ApiResponse<Vec<BillResponse>>),
    ),
    tag = "bills"
)]
pub async fn list_bills(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BillResponse>>>, ServiceError> {
    let bills = state.services.billing.list_bills().await?;
    Ok(Json(ApiResponse::success(bills)))
}

#[utoipa::path(
    get,
    path = "/api/v1/bills/{id}",
    summary = "Get bill",
    params(
        ("id" = i64, Path, description = "Bill ID"),
    ),
    responses(
        (status = 200, description = "Bill retrieved successfully", body = ApiResponse<BillResponse>),
        (status = 404, description = "Bill not found", body = crate::errors::ErrorResponse),
    ),
    tag = "bills"
)]
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BillResponse>>, ServiceError> {
    let bill = state
        .services
        .billing
        .get_bill(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Bill with id {} not found", id)))?;
    Ok(Json(ApiResponse::success(bill)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/print",
    summary = "Print bill",
    description = "Renders the stored bill and sends it to the configured printer, \
                   or returns the plain-text rendering when preview is set",
    params(
        ("id" = i64, Path, description = "Bill ID"),
    ),
    request_body = PrintBillRequest,
    responses(
        (status = 200, description = "Bill printed or previewed", body = ApiResponse<PrintBillResponse>),
        (status = 404, description = "Bill not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Printer unreachable", body = crate::errors::ErrorResponse),
    ),
    tag = "bills"
)]
pub async fn print_bill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PrintBillRequest>,
) -> Result<Json<ApiResponse<PrintBillResponse>>, ServiceError> {
    let bill = state
        .services
        .billing
        .get_bill(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Bill with id {} not found", id)))?;

    let order = state
        .services
        .orders
        .get_order(bill.order_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Order with id {} not found", bill.order_id))
        })?;

    if request.preview {
        let text = receipt::render_text(&bill, &order.lines);
        return Ok(Json(ApiResponse::success(PrintBillResponse {
            bill_id: bill.id,
            printed: false,
            preview: Some(text),
        })));
    }

    let data = receipt::render_escpos(&bill, &order.lines);
    let printer = effective_printer(&state.config.printer, request.printer);
    transport::deliver(&printer, &data).await?;

    if let Some(event_sender) = &state.event_sender {
        if let Err(e) = event_sender
            .send(Event::BillPrinted {
                bill_id: bill.id,
                transport: printer.mode.clone(),
            })
            .await
        {
            warn!(error = %e, bill_id = %bill.id, "Failed to send bill printed event");
        }
    }

    Ok(Json(ApiResponse::success(PrintBillResponse {
        bill_id: bill.id,
        printed: true,
        preview: None,
    })))
}

fn effective_printer(base: &PrinterConfig, overrides: Option<PrinterOverride>) -> PrinterConfig {
    let mut config = base.clone();
    if let Some(o) = overrides {
        if let Some(mode) = o.mode {
            config.mode = mode;
        }
        if let Some(ip) = o.ip {
            config.ip = ip;
        }
        if let Some(port) = o.port {
            config.port = port;
        }
        if let Some(device_path) = o.device_path {
            config.device_path = device_path;
        }
        if let Some(printer_name) = o.printer_name {
            config.printer_name = printer_name;
        }
    }
    config
}
