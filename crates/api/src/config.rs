//! Service configuration loaded from environment variables.

use std::time::Duration;

use common::ProductId;
use thiserror::Error;

/// Which of the three services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Order,
    Inventory,
    Payment,
}

impl Service {
    /// Port used when `PORT` is not set.
    pub fn default_port(&self) -> u16 {
        match self {
            Service::Order => 8080,
            Service::Inventory => 8081,
            Service::Payment => 8082,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Service::Order => "order",
            Service::Inventory => "inventory",
            Service::Payment => "payment",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A configuration value that could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` (default `0.0.0.0`) and `PORT` (default 8080/8081/8082 for
///   order/inventory/payment)
/// - `RUST_LOG` tracing filter (default `info`) and `LOG_FORMAT` (`json` or text)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory stores when unset
/// - `DATABASE_MAX_CONNECTIONS` (default 5)
/// - `INVENTORY_SERVICE_URL` / `PAYMENT_SERVICE_URL`: downstream services of the
///   order service
/// - `INVENTORY_SEED`: initial stock such as `p1=5,p2=10`
/// - `DOWNSTREAM_TIMEOUT_SECS`: request timeout for downstream calls (none by default)
/// - `SAGA_SHUTDOWN_TIMEOUT_SECS`: how long shutdown waits for running sagas (default 10)
#[derive(Debug, Clone)]
pub struct Config {
    pub service: Service,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub inventory_service_url: String,
    pub payment_service_url: String,
    pub inventory_seed: Vec<(ProductId, u32)>,
    pub downstream_timeout: Option<Duration>,
    pub saga_shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env(service: Service) -> Result<Self, ConfigError> {
        Self::from_lookup(service, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service: Service, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults(service);
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &port, e))?;
        }
        if let Some(level) = get("RUST_LOG") {
            config.log_level = level;
        }
        if let Some(format) = get("LOG_FORMAT") {
            config.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "pretty" => LogFormat::Text,
                _ => {
                    return Err(ConfigError::invalid(
                        "LOG_FORMAT",
                        &format,
                        "expected json or text",
                    ));
                }
            };
        }
        config.database_url = get("DATABASE_URL");
        if let Some(max) = get("DATABASE_MAX_CONNECTIONS") {
            config.database_max_connections = max
                .parse()
                .map_err(|e| ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &max, e))?;
        }
        if let Some(url) = get("INVENTORY_SERVICE_URL") {
            config.inventory_service_url = url;
        }
        if let Some(url) = get("PAYMENT_SERVICE_URL") {
            config.payment_service_url = url;
        }
        if let Some(seed) = get("INVENTORY_SEED") {
            config.inventory_seed = parse_seed(&seed)?;
        }
        if let Some(secs) = get("DOWNSTREAM_TIMEOUT_SECS") {
            config.downstream_timeout = Some(parse_secs("DOWNSTREAM_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("SAGA_SHUTDOWN_TIMEOUT_SECS") {
            config.saga_shutdown_timeout = parse_secs("SAGA_SHUTDOWN_TIMEOUT_SECS", &secs)?;
        }

        Ok(config)
    }

    /// Default configuration for a service.
    pub fn defaults(service: Service) -> Self {
        Self {
            service,
            host: "0.0.0.0".to_string(),
            port: service.default_port(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 5,
            inventory_service_url: "http://localhost:8081".to_string(),
            payment_service_url: "http://localhost:8082".to_string(),
            inventory_seed: Vec::new(),
            downstream_timeout: None,
            saga_shutdown_timeout: Duration::from_secs(10),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the HTTP client used for downstream calls.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.downstream_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Parses `p1=5,p2=10` into stock levels.
pub fn parse_seed(raw: &str) -> Result<Vec<(ProductId, u32)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, quantity) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::invalid("INVENTORY_SEED", entry, "expected id=quantity"))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(ConfigError::invalid(
                    "INVENTORY_SEED",
                    entry,
                    "empty product id",
                ));
            }
            let quantity = quantity
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("INVENTORY_SEED", entry, e))?;
            Ok((ProductId::new(id), quantity))
        })
        .collect()
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::invalid(var, raw, e))
}
