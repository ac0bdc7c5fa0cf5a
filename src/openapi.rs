use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Restaurant POS API",
        version = "0.1.0",
        description = r#"
# Restaurant Point-of-Sale API

Backend for a dine-in restaurant: menu catalog, table occupancy, order
lifecycle, and GST bill issuance with thermal receipt printing.

## Order-to-bill flow

1. `POST /api/v1/orders` opens an order for a free table and snapshots
   menu prices into its lines.
2. `PUT /api/v1/orders/{id}` replaces the line set while the order is open.
3. `POST /api/v1/bills` closes the order: one transaction issues the bill
   with the next invoice number, marks the order paid, and frees the table.
4. `POST /api/v1/bills/{id}/print` renders the stored bill to the
   configured ESC/POS printer, or returns a text preview.

## Error Handling

Errors use a consistent shape with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Not found: Order with id 42 not found",
  "request_id": "...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "menu", description = "Menu catalog endpoints"),
        (name = "tables", description = "Dining table endpoints"),
        (name = "orders", description = "Order lifecycle endpoints"),
        (name = "bills", description = "Bill issuance and printing endpoints")
    ),
    paths(
        // Menu
        crate::handlers::menu::list_menu,
        crate::handlers::menu::get_menu_item,
        crate::handlers::menu::create_menu_item,

        // Tables
        crate::handlers::tables::list_tables,
        crate::handlers::tables::get_table,
        crate::handlers::tables::create_table,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::replace_lines,
        crate::handlers::orders::update_order_status,

        // Bills
        crate::handlers::bills::close_order,
        crate::handlers::bills::list_bills,
        crate::handlers::bills::get_bill,
        crate::handlers::bills::print_bill,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            // Menu types
            crate::services::menu::CreateMenuItemRequest,
            crate::services::menu::MenuItemResponse,

            // Table types
            crate::services::tables::CreateTableRequest,
            crate::services::tables::TableResponse,

            // Order types
            crate::services::orders::OrderLineRequest,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::ReplaceLinesRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderLineResponse,
            crate::services::orders::OrderResponse,

            // Bill types
            crate::services::billing::CloseOrderRequest,
            crate::services::billing::BillResponse,
            crate::services::billing::ClosedOrder,
            crate::handlers::bills::PrintBillRequest,
            crate::handlers::bills::PrinterOverride,
            crate::handlers::bills::PrintBillResponse,
        )
    )
)]
pub struct ApiDoc;

/// Serves the generated document as JSON.
pub async fn serve() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
