use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use restaurant_pos_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    AppState,
};

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Boots the full router against a database that lives only as long
    /// as the harness.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("restaurant_pos_test.db");

        let mut cfg = AppConfig::default();
        cfg.database_url = format!("sqlite://{}?mode=rwc", db_path.display());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.seed_demo_data = false;
        cfg.port = 18_080;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("open test database");
        db::run_migrations(&pool)
            .await
            .expect("migrate test database");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, Some(event_sender));
        let router = restaurant_pos_api::app(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Create a menu item through the API and return its id.
    #[allow(dead_code)]
    pub async fn seed_menu_item(&self, name: &str, price: &str, category: &str) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/api/v1/menu",
                Some(json!({
                    "name": name,
                    "price": price,
                    "category": category,
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "seed menu item {}", name);
        let body = read_json(response).await;
        body["data"]["id"].as_i64().expect("menu item id")
    }

    /// Create a dining table through the API and return its id.
    #[allow(dead_code)]
    pub async fn seed_table(&self, number: i32) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/api/v1/tables",
                Some(json!({ "number": number })),
            )
            .await;
        assert_eq!(response.status(), 201, "seed table {}", number);
        let body = read_json(response).await;
        body["data"]["id"].as_i64().expect("table id")
    }

    /// Open an order through the API and return the response data.
    #[allow(dead_code)]
    pub async fn place_order(&self, table_id: i64, lines: Value) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "table_id": table_id,
                    "lines": lines,
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "place order for table {}", table_id);
        let body = read_json(response).await;
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
