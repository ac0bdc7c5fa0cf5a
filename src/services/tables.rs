use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{is_unique_violation, DbPool},
    entities::dining_table::{self, Entity as DiningTableEntity, TableStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

const DEFAULT_CAPACITY: i32 = 4;

/// Request/Response types for the table service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    #[validate(range(min = 1, message = "Table number must be positive"))]
    pub number: i32,
    #[validate(range(min = 1, max = 50, message = "Capacity must be between 1 and 50"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    pub id: i64,
    pub number: i32,
    pub capacity: i32,
    pub status: String,
    pub current_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tracks per-table occupancy. All status flips go through this service so
/// the table/order invariant has a single owner: `occupy` and `release` are
/// called by the order and billing services inside their own transactions.
#[derive(Clone)]
pub struct TableService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl TableService {
    /// Creates a new table service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists all tables ordered by table number.
    #[instrument(skip(self))]
    pub async fn list_tables(&self) -> Result<Vec<TableResponse>, ServiceError> {
        let tables = DiningTableEntity::find()
            .order_by_asc(dining_table::Column::Number)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list tables");
                ServiceError::DatabaseError(e)
            })?;

        Ok(tables
            .into_iter()
            .map(|table| self.model_to_response(table))
            .collect())
    }

    /// Retrieves a table by ID
    #[instrument(skip(self), fields(table_id = %table_id))]
    pub async fn get_table(&self, table_id: i64) -> Result<Option<TableResponse>, ServiceError> {
        let table = DiningTableEntity::find_by_id(table_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, table_id = %table_id, "Failed to fetch table");
                ServiceError::DatabaseError(e)
            })?;

        Ok(table.map(|model| self.model_to_response(model)))
    }

    /// Creates a new table. Table numbers are unique; a duplicate reports
    /// as invalid input rather than a constraint error.
    #[instrument(skip(self, request), fields(number = %request.number))]
    pub async fn create_table(
        &self,
        request: CreateTableRequest,
    ) -> Result<TableResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let active_model = dining_table::ActiveModel {
            number: Set(request.number),
            capacity: Set(request.capacity.unwrap_or(DEFAULT_CAPACITY)),
            status: Set(TableStatus::Available),
            current_order_id: Set(None),
            ..Default::default()
        };

        let model = active_model.insert(&*self.db_pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::InvalidInput(format!(
                    "Table number {} already exists",
                    request.number
                ))
            } else {
                error!(error = %e, number = %request.number, "Failed to create table");
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(table_id = %model.id, number = %model.number, "Table created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::TableCreated(model.id)).await {
                warn!(error = %e, table_id = %model.id, "Failed to send table created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Marks a table occupied by `order_id`, on the caller's connection so
    /// it joins the order-creation transaction. The status condition in the
    /// update is the guard: a table that is occupied or reserved matches
    /// zero rows, and reserved tables are never overwritten here.
    pub async fn occupy<C: ConnectionTrait>(
        &self,
        conn: &C,
        table_id: i64,
        order_id: i64,
    ) -> Result<(), ServiceError> {
        let result = DiningTableEntity::update_many()
            .col_expr(
                dining_table::Column::Status,
                Expr::value(TableStatus::Occupied),
            )
            .col_expr(
                dining_table::Column::CurrentOrderId,
                Expr::value(Some(order_id)),
            )
            .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dining_table::Column::Id.eq(table_id))
            .filter(dining_table::Column::Status.eq(TableStatus::Available))
            .exec(conn)
            .await
            .map_err(|e| {
                error!(error = %e, table_id = %table_id, "Failed to occupy table");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            let table = DiningTableEntity::find_by_id(table_id)
                .one(conn)
                .await
                .map_err(|e| {
                    error!(error = %e, table_id = %table_id, "Failed to fetch table");
                    ServiceError::DatabaseError(e)
                })?;

            return Err(match table {
                None => ServiceError::NotFound(format!("Table with id {} not found", table_id)),
                Some(t) => ServiceError::InvalidInput(format!(
                    "Table {} is {} and cannot take a new order",
                    t.number,
                    t.status.as_str()
                )),
            });
        }

        info!(table_id = %table_id, order_id = %order_id, "Table occupied");
        Ok(())
    }

    /// Releases a table when the order occupying it is paid. Also runs on
    /// the caller's connection; the filter on `current_order_id` keeps a
    /// stale caller from releasing a table that moved on to another order.
    pub async fn release<C: ConnectionTrait>(
        &self,
        conn: &C,
        table_id: i64,
        order_id: i64,
    ) -> Result<(), ServiceError> {
        let result = DiningTableEntity::update_many()
            .col_expr(
                dining_table::Column::Status,
                Expr::value(TableStatus::Available),
            )
            .col_expr(
                dining_table::Column::CurrentOrderId,
                Expr::value(Option::<i64>::None),
            )
            .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dining_table::Column::Id.eq(table_id))
            .filter(dining_table::Column::Status.eq(TableStatus::Occupied))
            .filter(dining_table::Column::CurrentOrderId.eq(order_id))
            .exec(conn)
            .await
            .map_err(|e| {
                error!(error = %e, table_id = %table_id, "Failed to release table");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            error!(
                table_id = %table_id,
                order_id = %order_id,
                "Table is not occupied by this order; refusing to release"
            );
            return Err(ServiceError::InvalidInput(format!(
                "Table {} is not occupied by order {}",
                table_id, order_id
            )));
        }

        info!(table_id = %table_id, order_id = %order_id, "Table released");
        Ok(())
    }

    fn model_to_response(&self, model: dining_table::Model) -> TableResponse {
        TableResponse {
            id: model.id,
            number: model.number,
            capacity: model.capacity,
            status: model.status.as_str().to_string(),
            current_order_id: model.current_order_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
