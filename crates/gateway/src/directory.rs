//! Seams to the remote systems of record.

use async_trait::async_trait;
use domain::{ClientId, ProductId};

use crate::error::RemoteError;
use crate::model::{CustomerSnapshot, ProductSnapshot};

/// Read access to the customer directory.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Fetches the current customer record.
    async fn get_customer(&self, id: ClientId) -> Result<CustomerSnapshot, RemoteError>;
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetches the current product record.
    async fn get_product(&self, id: ProductId) -> Result<ProductSnapshot, RemoteError>;
}
