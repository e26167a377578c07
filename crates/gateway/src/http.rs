//! HTTP implementations of the directory seams.

use async_trait::async_trait;
use domain::{ClientId, ProductId};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::directory::{CustomerDirectory, ProductCatalog};
use crate::error::{CallSite, RemoteError, classify_status};
use crate::model::{CustomerSnapshot, ProductSnapshot};
use crate::retry::{RetryPolicy, retry_on_transient};

/// Shared GET client with timeouts and retries.
#[derive(Debug, Clone)]
struct JsonGetter {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl JsonGetter {
    fn new(config: &GatewayConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, site: CallSite) -> Result<T, RemoteError> {
        let result = retry_on_transient(self.retry, |_| self.get_once(url, site)).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.outcome(),
        };
        metrics::counter!(
            "gateway_requests_total",
            "target" => site.resource(),
            "outcome" => outcome
        )
        .increment(1);

        result
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        site: CallSite,
    ) -> Result<T, RemoteError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), site));
        }

        Ok(response.json::<T>().await?)
    }
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Customer directory reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCustomerDirectory {
    getter: JsonGetter,
    base_url: String,
}

impl HttpCustomerDirectory {
    pub fn new(config: &GatewayConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            getter: JsonGetter::new(config)?,
            base_url: config.customer_base_url.clone(),
        })
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    async fn get_customer(&self, id: ClientId) -> Result<CustomerSnapshot, RemoteError> {
        let url = join(&self.base_url, &format!("/api/customers/{id}"));
        self.getter.get(&url, CallSite::Customer).await
    }
}

/// Product catalog reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    getter: JsonGetter,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(config: &GatewayConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            getter: JsonGetter::new(config)?,
            base_url: config.product_base_url.clone(),
        })
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn get_product(&self, id: ProductId) -> Result<ProductSnapshot, RemoteError> {
        let url = join(&self.base_url, &format!("/api/products/{id}"));
        self.getter.get(&url, CallSite::Product).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_strips_trailing_slash() {
        assert_eq!(
            join("http://localhost:8081/", "/api/customers/1"),
            "http://localhost:8081/api/customers/1"
        );
        assert_eq!(
            join("http://localhost:8082", "/api/products/7"),
            "http://localhost:8082/api/products/7"
        );
    }
}
