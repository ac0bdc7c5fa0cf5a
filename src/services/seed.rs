use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait, Set};
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    entities::{
        dining_table::{self, Entity as DiningTableEntity, TableStatus},
        menu_item::{self, Entity as MenuItemEntity},
    },
    errors::ServiceError,
};

const DEMO_MENU: [(&str, Decimal, &str); 8] = [
    ("Margherita Pizza", dec!(299.00), "Pizza"),
    ("Pepperoni Pizza", dec!(399.00), "Pizza"),
    ("Caesar Salad", dec!(199.00), "Salads"),
    ("Chicken Wings", dec!(299.00), "Starters"),
    ("Pasta Carbonara", dec!(349.00), "Pasta"),
    ("Chocolate Cake", dec!(149.00), "Desserts"),
    ("Iced Tea", dec!(49.00), "Beverages"),
    ("Coffee", dec!(39.00), "Beverages"),
];

const DEMO_TABLE_COUNT: i32 = 10;
const DEMO_TABLE_CAPACITY: i32 = 4;

/// Seeds the demo catalog and tables into an empty database so a bare
/// checkout can take orders immediately. Existing rows suppress the seed.
#[instrument(skip(db))]
pub async fn seed_demo_data(db: &DbPool) -> Result<(), ServiceError> {
    let now = Utc::now();

    let item_count = MenuItemEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if item_count == 0 {
        let items: Vec<menu_item::ActiveModel> = DEMO_MENU
            .iter()
            .map(|(name, price, category)| menu_item::ActiveModel {
                name: Set((*name).to_string()),
                description: Set(None),
                price: Set(*price),
                category: Set((*category).to_string()),
                available: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            })
            .collect();

        MenuItemEntity::insert_many(items)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(count = DEMO_MENU.len(), "Seeded demo menu items");
    }

    let table_count = DiningTableEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if table_count == 0 {
        let tables: Vec<dining_table::ActiveModel> = (1..=DEMO_TABLE_COUNT)
            .map(|number| dining_table::ActiveModel {
                number: Set(number),
                capacity: Set(DEMO_TABLE_CAPACITY),
                status: Set(TableStatus::Available),
                current_order_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            })
            .collect();

        DiningTableEntity::insert_many(tables)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(count = DEMO_TABLE_COUNT, "Seeded demo tables");
    }

    Ok(())
}
