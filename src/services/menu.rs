use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    db::DbPool,
    entities::menu_item::{self, Entity as MenuItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Price must not be negative".into());
        Err(err)
    }
}

/// Request to create a menu item
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Decimal,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    pub available: Option<bool>,
}

/// Menu item as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog of orderable items. Lookups by id resolve unavailable items too,
/// because existing order lines keep referencing them; only the listing
/// filters to what can currently be ordered.
#[derive(Clone)]
pub struct MenuService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl MenuService {
    /// Creates a new menu service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists available items, optionally restricted to one category,
    /// ordered by category then name.
    #[instrument(skip(self))]
    pub async fn list_available(
        &self,
        category: Option<String>,
    ) -> Result<Vec<MenuItemResponse>, ServiceError> {
        let mut query = MenuItemEntity::find().filter(menu_item::Column::Available.eq(true));

        if let Some(category) = category {
            query = query.filter(menu_item::Column::Category.eq(category));
        }

        let items = query
            .order_by_asc(menu_item::Column::Category)
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list menu items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items
            .into_iter()
            .map(|item| self.model_to_response(item))
            .collect())
    }

    /// Retrieves a menu item by ID, available or not.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: i64) -> Result<Option<MenuItemResponse>, ServiceError> {
        let item = MenuItemEntity::find_by_id(item_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = %item_id, "Failed to fetch menu item");
                ServiceError::DatabaseError(e)
            })?;

        Ok(item.map(|model| self.model_to_response(model)))
    }

    /// Creates a new menu item
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let active_model = menu_item::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            category: Set(request.category),
            available: Set(request.available.unwrap_or(true)),
            ..Default::default()
        };

        let model = active_model.insert(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, "Failed to create menu item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %model.id, name = %model.name, "Menu item created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::MenuItemCreated(model.id)).await {
                warn!(error = %e, item_id = %model.id, "Failed to send menu item created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    fn model_to_response(&self, model: menu_item::Model) -> MenuItemResponse {
        MenuItemResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            available: model.available,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_price_fails_validation() {
        let request = CreateMenuItemRequest {
            name: "Paneer Tikka".to_string(),
            description: None,
            price: dec!(-1.00),
            category: "Starters".to_string(),
            available: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_price_is_accepted() {
        let request = CreateMenuItemRequest {
            name: "Complimentary Papad".to_string(),
            description: None,
            price: dec!(0.00),
            category: "Starters".to_string(),
            available: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_name_fails_validation() {
        let request = CreateMenuItemRequest {
            name: String::new(),
            description: None,
            price: dec!(99.00),
            category: "Starters".to_string(),
            available: None,
        };
        assert!(request.validate().is_err());
    }
}
