pub mod bills;
pub mod menu;
pub mod orders;
pub mod tables;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub menu: Arc<crate::services::menu::MenuService>,
    pub tables: Arc<crate::services::tables::TableService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub billing: Arc<crate::services::billing::BillingService>,
}

impl AppServices {
    /// Builds the service container. The table service is shared so order
    /// creation and bill issuance flip occupancy through one component.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        config: &AppConfig,
    ) -> Self {
        let tables = crate::services::tables::TableService::new(
            db_pool.clone(),
            event_sender.clone(),
        );
        let menu = crate::services::menu::MenuService::new(
            db_pool.clone(),
            event_sender.clone(),
        );
        let orders = crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            tables.clone(),
        );
        let billing = crate::services::billing::BillingService::new(
            db_pool,
            event_sender,
            tables.clone(),
            config.restaurant.clone(),
        );

        Self {
            menu: Arc::new(menu),
            tables: Arc::new(tables),
            orders: Arc::new(orders),
            billing: Arc::new(billing),
        }
    }
}
