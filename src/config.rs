use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_DATABASE_URL: &str = "sqlite://restaurant_pos.db?mode=rwc";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading error: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Full runtime settings: database, HTTP, logging, restaurant identity,
/// and printer transport. Loaded once at startup.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite or Postgres connection string
    #[serde(default = "default_database_url")]
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Maximum size of the connection pool
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Minimum number of idle connections to keep around
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Seconds to wait for a connection before giving up
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Apply pending migrations before serving
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// Insert the demo menu and tables when the database is empty
    #[serde(default = "default_true_bool")]
    pub seed_demo_data: bool,

    /// Bind address for the HTTP listener
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener port, unprivileged range only
    #[serde(default = "default_port")]
    #[validate(range(min = 1024, max = 65535))]
    pub port: u16,

    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit log lines as JSON instead of human-readable text
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins; unset allows any
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Identity printed on bills; snapshotted onto each bill at issuance
    #[serde(default)]
    #[validate]
    pub restaurant: RestaurantConfig,

    /// Receipt printer transport
    #[serde(default)]
    #[validate]
    pub printer: PrinterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            auto_migrate: true,
            seed_demo_data: true,
            host: default_host(),
            port: DEFAULT_PORT,
            log_level: default_log_level(),
            log_json: false,
            cors_allowed_origins: None,
            restaurant: RestaurantConfig::default(),
            printer: PrinterConfig::default(),
        }
    }
}

/// Restaurant identity fields. These are the defaults for bill snapshots;
/// a close-order request may override individual fields.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RestaurantConfig {
    #[serde(default = "default_restaurant_name")]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default = "default_restaurant_address")]
    pub address: String,
    #[serde(default = "default_restaurant_state")]
    pub state: String,
    #[serde(default = "default_restaurant_state_code")]
    pub state_code: String,
    #[serde(default = "default_restaurant_phone")]
    pub phone: String,
    #[serde(default = "default_restaurant_gstin")]
    pub gstin: String,
    #[serde(default = "default_restaurant_fssai")]
    pub fssai: String,
    #[serde(default = "default_restaurant_place_of_supply")]
    pub place_of_supply: String,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            name: default_restaurant_name(),
            address: default_restaurant_address(),
            state: default_restaurant_state(),
            state_code: default_restaurant_state_code(),
            phone: default_restaurant_phone(),
            gstin: default_restaurant_gstin(),
            fssai: default_restaurant_fssai(),
            place_of_supply: default_restaurant_place_of_supply(),
        }
    }
}

/// Printer transport configuration. `mode` selects which transport is used
/// when a print request does not override it.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PrinterConfig {
    /// One of "network", "device", "system"
    #[serde(default = "default_printer_mode")]
    pub mode: String,
    #[serde(default = "default_printer_ip")]
    pub ip: String,
    #[serde(default = "default_printer_port")]
    pub port: u16,
    /// Character device written to in "device" mode
    #[serde(default = "default_printer_device_path")]
    pub device_path: String,
    /// Queue name passed to `lpr -P` in "system" mode
    #[serde(default = "default_printer_name")]
    pub printer_name: String,
    #[serde(default = "default_printer_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            mode: default_printer_mode(),
            ip: default_printer_ip(),
            port: default_printer_port(),
            device_path: default_printer_device_path(),
            printer_name: default_printer_name(),
            connect_timeout_secs: default_printer_connect_timeout_secs(),
        }
    }
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    10
}
fn default_true_bool() -> bool {
    true
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_restaurant_name() -> String {
    "KHAN SAHAB RESTAURANT".to_string()
}
fn default_restaurant_address() -> String {
    "4, BANSAL NAGAR FATEHABAD ROAD AGRA".to_string()
}
fn default_restaurant_state() -> String {
    "Uttar Pradesh".to_string()
}
fn default_restaurant_state_code() -> String {
    "09".to_string()
}
fn default_restaurant_phone() -> String {
    "9319209322".to_string()
}
fn default_restaurant_gstin() -> String {
    "09AHDPA1039P2ZB".to_string()
}
fn default_restaurant_fssai() -> String {
    "12722001001504".to_string()
}
fn default_restaurant_place_of_supply() -> String {
    "Uttar Pradesh".to_string()
}
fn default_printer_mode() -> String {
    "network".to_string()
}
fn default_printer_ip() -> String {
    "192.168.1.100".to_string()
}
fn default_printer_port() -> u16 {
    9100
}
fn default_printer_device_path() -> String {
    "/dev/usb/lp0".to_string()
}
fn default_printer_name() -> String {
    "thermal".to_string()
}
fn default_printer_connect_timeout_secs() -> u64 {
    5
}

pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting the config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", DEFAULT_PORT)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(File::with_name(&format!("{}/local", CONFIG_DIR)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
