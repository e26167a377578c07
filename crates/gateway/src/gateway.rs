//! Validation and best-effort lookups on top of the directory seams.

use domain::{ClientId, ProductId};

use crate::directory::{CustomerDirectory, ProductCatalog};
use crate::error::{CustomerRejection, GatewayError, ProductRejection};
use crate::model::{CustomerSnapshot, ProductSnapshot};

/// Turns remote lookups into domain answers.
///
/// Validation fails closed: any remote failure rejects the resource.
/// Fetching fails open: any remote failure yields `None`.
#[derive(Debug, Clone)]
pub struct ValidationGateway<C, P> {
    customers: C,
    products: P,
}

impl<C, P> ValidationGateway<C, P>
where
    C: CustomerDirectory,
    P: ProductCatalog,
{
    pub fn new(customers: C, products: P) -> Self {
        Self {
            customers,
            products,
        }
    }

    pub fn customers(&self) -> &C {
        &self.customers
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    /// Checks that the customer exists and is active.
    #[tracing::instrument(skip(self))]
    pub async fn validate_customer(
        &self,
        client_id: ClientId,
    ) -> Result<CustomerSnapshot, GatewayError> {
        let customer = self
            .customers
            .get_customer(client_id)
            .await
            .map_err(|err| {
                let reason = if err.is_not_found() {
                    CustomerRejection::NotFound
                } else {
                    tracing::warn!(error = %err, "customer directory call failed");
                    CustomerRejection::RemoteUnavailable(err)
                };
                GatewayError::ClientInvalid { client_id, reason }
            })?;

        if !customer.is_active() {
            return Err(GatewayError::ClientInvalid {
                client_id,
                reason: CustomerRejection::Inactive {
                    status: customer.status,
                },
            });
        }

        Ok(customer)
    }

    /// Checks that the product exists and is available, that it has
    /// `quantity` in stock, and that its price is a positive amount.
    #[tracing::instrument(skip(self))]
    pub async fn validate_product(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductSnapshot, GatewayError> {
        let reject = |reason| GatewayError::ProductInvalid { product_id, reason };

        let product = self
            .products
            .get_product(product_id)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    reject(ProductRejection::NotFound)
                } else {
                    tracing::warn!(error = %err, "product catalog call failed");
                    reject(ProductRejection::RemoteUnavailable(err))
                }
            })?;

        if !product.is_available() {
            return Err(reject(ProductRejection::NotAvailable));
        }

        if !product.has_stock(quantity) {
            return Err(reject(ProductRejection::InsufficientStock {
                requested: quantity,
                available: product.stock,
            }));
        }

        if product.sellable_price().is_none() {
            return Err(reject(ProductRejection::InvalidPrice {
                price: product.price,
            }));
        }

        Ok(product)
    }

    /// Looks up a customer for display. Failures are logged and absorbed.
    pub async fn fetch_customer(&self, client_id: ClientId) -> Option<CustomerSnapshot> {
        match self.customers.get_customer(client_id).await {
            Ok(customer) => Some(customer),
            Err(err) => {
                metrics::counter!("enrichment_failures_total", "target" => "customer")
                    .increment(1);
                tracing::warn!(%client_id, error = %err, "customer lookup failed, leaving it out");
                None
            }
        }
    }

    /// Looks up a product for display. Failures are logged and absorbed.
    pub async fn fetch_product(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        match self.products.get_product(product_id).await {
            Ok(product) => Some(product),
            Err(err) => {
                metrics::counter!("enrichment_failures_total", "target" => "product")
                    .increment(1);
                tracing::warn!(%product_id, error = %err, "product lookup failed, leaving it out");
                None
            }
        }
    }
}
