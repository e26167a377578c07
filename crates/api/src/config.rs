//! Application configuration loaded from environment variables.

use std::time::Duration;

use gateway::{GatewayConfig, RetryPolicy};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; orders are kept in memory when unset
/// - `CUSTOMER_SERVICE_URL` / `PRODUCT_SERVICE_URL`: directory base URLs
/// - `GATEWAY_CONNECT_TIMEOUT_MS` / `GATEWAY_REQUEST_TIMEOUT_MS` / `GATEWAY_MAX_ATTEMPTS`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());

        let gateway = GatewayConfig {
            customer_base_url: lookup("CUSTOMER_SERVICE_URL")
                .unwrap_or(defaults.gateway.customer_base_url),
            product_base_url: lookup("PRODUCT_SERVICE_URL")
                .unwrap_or(defaults.gateway.product_base_url),
            connect_timeout: parsed("GATEWAY_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.gateway.connect_timeout),
            request_timeout: parsed("GATEWAY_REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.gateway.request_timeout),
            retry: RetryPolicy {
                max_attempts: parsed("GATEWAY_MAX_ATTEMPTS")
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|&n| n > 0)
                    .unwrap_or(defaults.gateway.retry.max_attempts),
                ..defaults.gateway.retry
            },
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            gateway,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            gateway: GatewayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_pairs(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.gateway.customer_base_url, "http://localhost:8081");
        assert_eq!(config.gateway.product_base_url, "http://localhost:8082");
        assert_eq!(config.gateway.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.gateway.request_timeout, Duration::from_secs(60));
        assert_eq!(config.gateway.retry.max_attempts, 3);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("CUSTOMER_SERVICE_URL", "http://customers:9000"),
            ("GATEWAY_REQUEST_TIMEOUT_MS", "1500"),
            ("GATEWAY_MAX_ATTEMPTS", "5"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/orders")
        );
        assert_eq!(config.gateway.customer_base_url, "http://customers:9000");
        assert_eq!(config.gateway.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.gateway.retry.max_attempts, 5);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("GATEWAY_MAX_ATTEMPTS", "0"),
            ("DATABASE_URL", ""),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.gateway.retry.max_attempts, 3);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
