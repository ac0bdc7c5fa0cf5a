use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        dining_table::{Entity as DiningTableEntity, TableStatus},
        menu_item::{self, Entity as MenuItemEntity},
        order::{self, Entity as OrderEntity, OrderStatus, PaymentMethod},
        order_line::{self, Entity as OrderLineEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::tables::TableService,
};

/// One line of an order request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    pub quantity: i32,
}

/// Request to create an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub table_id: i64,
    #[validate(length(min = 1, message = "Order must contain at least one line"))]
    pub lines: Vec<OrderLineRequest>,
}

/// Request to replace the full line set of an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReplaceLinesRequest {
    #[validate(length(min = 1, message = "Order must contain at least one line"))]
    pub lines: Vec<OrderLineRequest>,
}

/// Request to update an order's status. The tax fields are optional
/// caller-side figures and are stored exactly as given.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub tax_rate: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub final_total: Option<Decimal>,
    pub payment_method: Option<String>,
}

/// One line of an order as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Order as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub table_id: i64,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub total_amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub final_total: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct PreparedLine {
    menu_item_id: i64,
    name: String,
    quantity: i32,
    unit_price: Decimal,
}

/// Order lifecycle: creation with price snapshotting, full line replacement,
/// and status updates. Orders stay mutable until a bill closes them; the
/// paid status is owned by the billing service and rejected here.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    tables: TableService,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        tables: TableService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            tables,
        }
    }

    /// Creates an order for a table. Unit prices are snapshotted from the
    /// catalog at this moment; the order, its lines, and the table occupancy
    /// commit in one transaction.
    #[instrument(skip(self, request), fields(table_id = %request.table_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            ServiceError::DatabaseError(e)
        })?;

        let table = DiningTableEntity::find_by_id(request.table_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, table_id = %request.table_id, "Failed to fetch table");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Table with id {} not found", request.table_id))
            })?;

        if table.status != TableStatus::Available {
            return Err(ServiceError::InvalidInput(format!(
                "Table {} is {} and cannot take a new order",
                table.number,
                table.status.as_str()
            )));
        }

        let (prepared, total_amount) = prepare_lines(&txn, &request.lines).await?;

        let order_model = order::ActiveModel {
            table_id: Set(request.table_id),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total_amount),
            tax_rate: Set(Decimal::ZERO),
            tax_amount: Set(Decimal::ZERO),
            final_total: Set(total_amount),
            payment_method: Set(PaymentMethod::Cash),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let lines = insert_lines(&txn, order_model.id, prepared).await?;

        // Conditional update inside the same transaction; of two concurrent
        // orders for this table, one occupy call matches zero rows and the
        // whole creation rolls back.
        self.tables
            .occupy(&txn, request.table_id, order_model.id)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_model.id,
            table_id = %order_model.table_id,
            total_amount = %order_model.total_amount,
            "Order created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderCreated {
                    order_id: order_model.id,
                    table_id: order_model.table_id,
                })
                .await
            {
                warn!(error = %e, order_id = %order_model.id, "Failed to send order created event");
            }
        }

        Ok(self.model_to_response(order_model, lines))
    }

    /// Replaces the entire line set of an order and recomputes its subtotal.
    /// This is a full replace: lines absent from the request are removed.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn replace_lines(
        &self,
        order_id: i64,
        request: ReplaceLinesRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with id {} not found", order_id))
            })?;

        if order_model.status == OrderStatus::Paid {
            return Err(ServiceError::AlreadyPaid(order_id.to_string()));
        }

        let (prepared, total_amount) = prepare_lines(&txn, &request.lines).await?;

        OrderLineEntity::delete_many()
            .filter(order_line::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order lines");
                ServiceError::DatabaseError(e)
            })?;

        let lines = insert_lines(&txn, order_id, prepared).await?;
        let line_count = lines.len();

        let tax_amount = order_model.tax_amount;
        let mut active: order::ActiveModel = order_model.into();
        active.total_amount = Set(total_amount);
        active.final_total = Set(total_amount + tax_amount);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order totals");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit line replacement");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            line_count = %line_count,
            total_amount = %updated.total_amount,
            "Order lines replaced"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderLinesReplaced {
                    order_id,
                    line_count,
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send lines replaced event");
            }
        }

        Ok(self.model_to_response(updated, lines))
    }

    /// Updates an order's kitchen status. `paid` is not accepted here:
    /// payment runs through bill issuance so the two cannot diverge.
    #[instrument(skip(self, request), fields(order_id = %order_id, status = %request.status))]
    pub async fn update_status(
        &self,
        order_id: i64,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let new_status = OrderStatus::parse(&request.status)
            .ok_or_else(|| ServiceError::InvalidStatus(request.status.clone()))?;

        if new_status == OrderStatus::Paid {
            return Err(ServiceError::InvalidInput(
                "Orders are marked paid by closing them via POST /api/v1/bills".to_string(),
            ));
        }

        let payment_method = match &request.payment_method {
            Some(raw) => Some(PaymentMethod::parse(raw).ok_or_else(|| {
                ServiceError::InvalidInput(format!("Invalid payment method: {}", raw))
            })?),
            None => None,
        };

        for (field, value) in [
            ("tax_rate", request.tax_rate),
            ("tax_amount", request.tax_amount),
            ("final_total", request.final_total),
        ] {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(ServiceError::InvalidInput(format!(
                        "{} must not be negative",
                        field
                    )));
                }
            }
        }

        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with id {} not found", order_id))
            })?;

        if order_model.status == OrderStatus::Paid {
            return Err(ServiceError::AlreadyPaid(order_id.to_string()));
        }

        let old_status = order_model.status.as_str().to_string();

        let mut active: order::ActiveModel = order_model.into();
        active.status = Set(new_status);
        if let Some(rate) = request.tax_rate {
            active.tax_rate = Set(rate);
        }
        if let Some(amount) = request.tax_amount {
            active.tax_amount = Set(amount);
        }
        if let Some(total) = request.final_total {
            active.final_total = Set(total);
        }
        if let Some(method) = payment_method {
            active.payment_method = Set(method);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %updated.status.as_str(),
            "Order status updated"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: updated.status.as_str().to_string(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
            }
        }

        let lines = load_lines(db, order_id).await?;
        Ok(self.model_to_response(updated, lines))
    }

    /// Retrieves an order with its lines
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: i64) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?;

        match order_model {
            None => Ok(None),
            Some(model) => {
                let lines = load_lines(db, model.id).await?;
                Ok(Some(self.model_to_response(model, lines)))
            }
        }
    }

    /// Lists orders, newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<String>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find();
        if let Some(raw) = status {
            let parsed =
                OrderStatus::parse(&raw).ok_or_else(|| ServiceError::InvalidStatus(raw))?;
            query = query.filter(order::Column::Status.eq(parsed));
        }

        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list orders");
                ServiceError::DatabaseError(e)
            })?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let all_lines = OrderLineEntity::find()
            .filter(order_line::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_line::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch order lines");
                ServiceError::DatabaseError(e)
            })?;

        let names = menu_item_names(db, all_lines.iter().map(|l| l.menu_item_id)).await?;

        let mut lines_by_order: HashMap<i64, Vec<OrderLineResponse>> = HashMap::new();
        for line in all_lines {
            let name = display_name(&names, line.menu_item_id);
            lines_by_order
                .entry(line.order_id)
                .or_default()
                .push(line_to_response(line, name));
        }

        Ok(orders
            .into_iter()
            .map(|model| {
                let lines = lines_by_order.remove(&model.id).unwrap_or_default();
                self.model_to_response(model, lines)
            })
            .collect())
    }

    fn model_to_response(
        &self,
        model: order::Model,
        lines: Vec<OrderLineResponse>,
    ) -> OrderResponse {
        OrderResponse {
            id: model.id,
            table_id: model.table_id,
            status: model.status.as_str().to_string(),
            lines,
            total_amount: model.total_amount,
            tax_rate: model.tax_rate,
            tax_amount: model.tax_amount,
            final_total: model.final_total,
            payment_method: model.payment_method.as_str().to_string(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validates each requested line against the catalog and snapshots unit
/// prices. Returns the prepared lines with their subtotal.
async fn prepare_lines<C: ConnectionTrait>(
    conn: &C,
    lines: &[OrderLineRequest],
) -> Result<(Vec<PreparedLine>, Decimal), ServiceError> {
    for (index, line) in lines.iter().enumerate() {
        if line.quantity < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "lines[{index}].quantity must be at least 1"
            )));
        }
    }

    let item_ids: Vec<i64> = lines.iter().map(|l| l.menu_item_id).collect();
    let items = MenuItemEntity::find()
        .filter(menu_item::Column::Id.is_in(item_ids))
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to resolve menu items");
            ServiceError::DatabaseError(e)
        })?;

    let catalog: HashMap<i64, menu_item::Model> =
        items.into_iter().map(|item| (item.id, item)).collect();

    let missing: Vec<String> = lines
        .iter()
        .filter(|l| !catalog.contains_key(&l.menu_item_id))
        .map(|l| l.menu_item_id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "Menu items not found: {}",
            missing.join(", ")
        )));
    }

    let mut total_amount = Decimal::ZERO;
    let mut prepared = Vec::with_capacity(lines.len());
    for line in lines {
        let item = &catalog[&line.menu_item_id];
        total_amount += item.price * Decimal::from(line.quantity);
        prepared.push(PreparedLine {
            menu_item_id: item.id,
            name: item.name.clone(),
            quantity: line.quantity,
            unit_price: item.price,
        });
    }

    Ok((prepared, total_amount))
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    prepared: Vec<PreparedLine>,
) -> Result<Vec<OrderLineResponse>, ServiceError> {
    let mut lines = Vec::with_capacity(prepared.len());
    for p in prepared {
        let inserted = order_line::ActiveModel {
            order_id: Set(order_id),
            menu_item_id: Set(p.menu_item_id),
            quantity: Set(p.quantity),
            unit_price: Set(p.unit_price),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order line");
            ServiceError::DatabaseError(e)
        })?;
        lines.push(line_to_response(inserted, p.name));
    }
    Ok(lines)
}

async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
) -> Result<Vec<OrderLineResponse>, ServiceError> {
    let rows = OrderLineEntity::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to fetch order lines");
            ServiceError::DatabaseError(e)
        })?;

    let names = menu_item_names(conn, rows.iter().map(|l| l.menu_item_id)).await?;

    Ok(rows
        .into_iter()
        .map(|line| {
            let name = display_name(&names, line.menu_item_id);
            line_to_response(line, name)
        })
        .collect())
}

async fn menu_item_names<C: ConnectionTrait>(
    conn: &C,
    ids: impl Iterator<Item = i64>,
) -> Result<HashMap<i64, String>, ServiceError> {
    let mut unique: Vec<i64> = ids.collect();
    unique.sort_unstable();
    unique.dedup();

    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let items = MenuItemEntity::find()
        .filter(menu_item::Column::Id.is_in(unique))
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch menu item names");
            ServiceError::DatabaseError(e)
        })?;

    Ok(items.into_iter().map(|item| (item.id, item.name)).collect())
}

fn display_name(names: &HashMap<i64, String>, menu_item_id: i64) -> String {
    names
        .get(&menu_item_id)
        .cloned()
        .unwrap_or_else(|| format!("Item {}", menu_item_id))
}

fn line_to_response(line: order_line::Model, name: String) -> OrderLineResponse {
    OrderLineResponse {
        id: line.id,
        menu_item_id: line.menu_item_id,
        name,
        quantity: line.quantity,
        unit_price: line.unit_price,
        line_total: line.unit_price * Decimal::from(line.quantity),
    }
}
