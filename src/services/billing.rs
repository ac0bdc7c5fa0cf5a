use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    config::RestaurantConfig,
    db::{is_unique_violation, DbPool},
    entities::{
        bill::{self, Entity as BillEntity},
        order::{self, Entity as OrderEntity, OrderStatus, PaymentMethod},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{tables::TableService, tax},
};

const MAX_ISSUE_ATTEMPTS: u32 = 5;

/// Request to close an order: issue its bill, mark it paid, release its
/// table. The profile fields override the configured restaurant identity
/// on this bill only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CloseOrderRequest {
    pub order_id: i64,
    pub tax_rate: Option<Decimal>,
    pub payment_method: Option<String>,
    pub restaurant_name: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub phone: Option<String>,
    pub gstin: Option<String>,
    pub fssai: Option<String>,
    pub place_of_supply: Option<String>,
}

/// Bill as returned by the API. Every field is the stored snapshot from
/// issuance time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    pub id: i64,
    pub order_id: i64,
    pub invoice_number: i64,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub restaurant_name: String,
    pub address: String,
    pub state: String,
    pub state_code: String,
    pub phone: String,
    pub gstin: String,
    pub fssai: String,
    pub place_of_supply: String,
    pub bill_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of closing an order. `newly_issued` is false when the order
/// already had a bill and that bill was returned unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClosedOrder {
    pub bill: BillResponse,
    pub newly_issued: bool,
}

struct ProfileSnapshot {
    restaurant_name: String,
    address: String,
    state: String,
    state_code: String,
    phone: String,
    gstin: String,
    fssai: String,
    place_of_supply: String,
}

/// Issues bills. A bill is immutable once written; `close_order` is the
/// only public write path and the only way an order becomes paid, so bill,
/// order status, and table occupancy can never disagree.
#[derive(Clone)]
pub struct BillingService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    tables: TableService,
    profile: RestaurantConfig,
}

impl BillingService {
    /// Creates a new billing service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        tables: TableService,
        profile: RestaurantConfig,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            tables,
            profile,
        }
    }

    /// Closes an order in one transaction: compute tax, assign the next
    /// invoice number, insert the bill, mark the order paid, release the
    /// table. Repeat calls for the same order return the existing bill.
    ///
    /// The UNIQUE indexes on `bills.order_id` and `bills.invoice_number`
    /// arbitrate races: a conflicting insert rolls the transaction back and
    /// the whole operation retries, re-reading state. The loser of a
    /// same-order race finds the winner's bill on its next attempt.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn close_order(
        &self,
        request: CloseOrderRequest,
    ) -> Result<ClosedOrder, ServiceError> {
        if let Some(rate) = request.tax_rate {
            if rate < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "tax_rate must not be negative".to_string(),
                ));
            }
        }

        let payment_override = match &request.payment_method {
            Some(raw) => Some(PaymentMethod::parse(raw).ok_or_else(|| {
                ServiceError::InvalidInput(format!("Invalid payment method: {}", raw))
            })?),
            None => None,
        };

        let db = &*self.db_pool;

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let txn = db.begin().await.map_err(|e| {
                error!(error = %e, "Failed to begin transaction");
                ServiceError::DatabaseError(e)
            })?;

            let order_model = OrderEntity::find_by_id(request.order_id)
                .one(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, order_id = %request.order_id, "Failed to fetch order");
                    ServiceError::DatabaseError(e)
                })?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Order with id {} not found",
                        request.order_id
                    ))
                })?;

            if let Some(existing) = BillEntity::find()
                .filter(bill::Column::OrderId.eq(order_model.id))
                .one(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, order_id = %order_model.id, "Failed to look up bill");
                    ServiceError::DatabaseError(e)
                })?
            {
                txn.commit().await.map_err(|e| {
                    error!(error = %e, "Failed to commit transaction");
                    ServiceError::DatabaseError(e)
                })?;
                info!(
                    order_id = %request.order_id,
                    bill_id = %existing.id,
                    invoice_number = %existing.invoice_number,
                    "Order already closed; returning existing bill"
                );
                return Ok(ClosedOrder {
                    bill: self.model_to_response(existing),
                    newly_issued: false,
                });
            }

            if order_model.status == OrderStatus::Paid {
                return Err(ServiceError::AlreadyPaid(order_model.id.to_string()));
            }

            let effective_rate = request.tax_rate.unwrap_or(order_model.tax_rate);
            let breakdown = tax::compute(order_model.total_amount, effective_rate)?;
            let invoice_number = next_invoice_number(&txn).await?;
            let snapshot = self.snapshot_profile(&request);
            let payment_method = payment_override.unwrap_or(order_model.payment_method);
            let now = Utc::now();

            let insert_result = bill::ActiveModel {
                order_id: Set(order_model.id),
                invoice_number: Set(invoice_number),
                subtotal: Set(order_model.total_amount),
                tax_rate: Set(effective_rate),
                tax_amount: Set(breakdown.tax_amount),
                total: Set(breakdown.total),
                payment_method: Set(payment_method),
                restaurant_name: Set(snapshot.restaurant_name),
                address: Set(snapshot.address),
                state: Set(snapshot.state),
                state_code: Set(snapshot.state_code),
                phone: Set(snapshot.phone),
                gstin: Set(snapshot.gstin),
                fssai: Set(snapshot.fssai),
                place_of_supply: Set(snapshot.place_of_supply),
                bill_date: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await;

            let bill_model = match insert_result {
                Ok(model) => model,
                Err(e) if is_unique_violation(&e) => {
                    warn!(
                        order_id = %request.order_id,
                        invoice_number = %invoice_number,
                        attempt = %attempt,
                        "Bill insert conflicted; retrying"
                    );
                    if let Err(rollback_err) = txn.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed after bill conflict");
                    }
                    continue;
                }
                Err(e) => {
                    error!(error = %e, order_id = %request.order_id, "Failed to insert bill");
                    return Err(ServiceError::DatabaseError(e));
                }
            };

            let table_id = order_model.table_id;
            let order_id = order_model.id;

            let mut active: order::ActiveModel = order_model.into();
            active.status = Set(OrderStatus::Paid);
            active.tax_rate = Set(effective_rate);
            active.tax_amount = Set(breakdown.tax_amount);
            active.final_total = Set(breakdown.total);
            active.payment_method = Set(payment_method);
            active.updated_at = Set(now);

            active.update(&txn).await.map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to mark order paid");
                ServiceError::DatabaseError(e)
            })?;

            self.tables.release(&txn, table_id, order_id).await?;

            txn.commit().await.map_err(|e| {
                error!(error = %e, "Failed to commit order close");
                ServiceError::DatabaseError(e)
            })?;

            info!(
                order_id = %order_id,
                bill_id = %bill_model.id,
                invoice_number = %bill_model.invoice_number,
                total = %bill_model.total,
                "Order closed and bill issued"
            );

            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender
                    .send(Event::OrderClosed {
                        order_id,
                        bill_id: bill_model.id,
                        invoice_number: bill_model.invoice_number,
                    })
                    .await
                {
                    warn!(error = %e, order_id = %order_id, "Failed to send order closed event");
                }
            }

            return Ok(ClosedOrder {
                bill: self.model_to_response(bill_model),
                newly_issued: true,
            });
        }

        error!(
            order_id = %request.order_id,
            attempts = %MAX_ISSUE_ATTEMPTS,
            "Invoice assignment kept conflicting"
        );
        Err(ServiceError::DatabaseError(DbErr::Custom(format!(
            "Invoice assignment conflicted after {} attempts",
            MAX_ISSUE_ATTEMPTS
        ))))
    }

    /// Retrieves a bill by ID
    #[instrument(skip(self), fields(bill_id = %bill_id))]
    pub async fn get_bill(&self, bill_id: i64) -> Result<Option<BillResponse>, ServiceError> {
        let bill_model = BillEntity::find_by_id(bill_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, bill_id = %bill_id, "Failed to fetch bill");
                ServiceError::DatabaseError(e)
            })?;

        Ok(bill_model.map(|model| self.model_to_response(model)))
    }

    /// Lists bills, newest first.
    #[instrument(skip(self))]
    pub async fn list_bills(&self) -> Result<Vec<BillResponse>, ServiceError> {
        let bills = BillEntity::find()
            .order_by_desc(bill::Column::CreatedAt)
            .order_by_desc(bill::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list bills");
                ServiceError::DatabaseError(e)
            })?;

        Ok(bills
            .into_iter()
            .map(|model| self.model_to_response(model))
            .collect())
    }

    fn snapshot_profile(&self, request: &CloseOrderRequest) -> ProfileSnapshot {
        ProfileSnapshot {
            restaurant_name: request
                .restaurant_name
                .clone()
                .unwrap_or_else(|| self.profile.name.clone()),
            address: request
                .address
                .clone()
                .unwrap_or_else(|| self.profile.address.clone()),
            state: request
                .state
                .clone()
                .unwrap_or_else(|| self.profile.state.clone()),
            state_code: request
                .state_code
                .clone()
                .unwrap_or_else(|| self.profile.state_code.clone()),
            phone: request
                .phone
                .clone()
                .unwrap_or_else(|| self.profile.phone.clone()),
            gstin: request
                .gstin
                .clone()
                .unwrap_or_else(|| self.profile.gstin.clone()),
            fssai: request
                .fssai
                .clone()
                .unwrap_or_else(|| self.profile.fssai.clone()),
            place_of_supply: request
                .place_of_supply
                .clone()
                .unwrap_or_else(|| self.profile.place_of_supply.clone()),
        }
    }

    fn model_to_response(&self, model: bill::Model) -> BillResponse {
        BillResponse {
            id: model.id,
            order_id: model.order_id,
            invoice_number: model.invoice_number,
            subtotal: model.subtotal,
            tax_rate: model.tax_rate,
            tax_amount: model.tax_amount,
            total: model.total,
            payment_method: model.payment_method.as_str().to_string(),
            restaurant_name: model.restaurant_name,
            address: model.address,
            state: model.state,
            state_code: model.state_code,
            phone: model.phone,
            gstin: model.gstin,
            fssai: model.fssai,
            place_of_supply: model.place_of_supply,
            bill_date: model.bill_date,
            created_at: model.created_at,
        }
    }
}

/// Next invoice number: one past the current maximum, starting at 1. Runs
/// on the issuing transaction; the unique index catches concurrent readers
/// that pick the same number.
async fn next_invoice_number<C: ConnectionTrait>(conn: &C) -> Result<i64, ServiceError> {
    let last = BillEntity::find()
        .order_by_desc(bill::Column::InvoiceNumber)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read last invoice number");
            ServiceError::DatabaseError(e)
        })?;

    Ok(last.map(|b| b.invoice_number + 1).unwrap_or(1))
}
