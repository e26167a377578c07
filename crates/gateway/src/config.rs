use std::time::Duration;

use crate::retry::RetryPolicy;

/// Transport settings for the remote directories.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the customer directory.
    pub customer_base_url: String,
    /// Base URL of the product catalog.
    pub product_base_url: String,
    pub connect_timeout: Duration,
    /// Bound on a whole request, body included.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            customer_base_url: "http://localhost:8081".to_string(),
            product_base_url: "http://localhost:8082".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}
