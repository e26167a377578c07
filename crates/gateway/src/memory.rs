//! In-memory directories for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::{ClientId, ProductId};

use crate::directory::{CustomerDirectory, ProductCatalog};
use crate::error::{CallSite, RemoteError, classify_status};
use crate::model::{CustomerSnapshot, ProductSnapshot};

#[derive(Debug, Default)]
struct CustomerState {
    customers: HashMap<ClientId, CustomerSnapshot>,
    failure: Option<RemoteError>,
    calls: usize,
}

/// In-memory customer directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    state: Arc<RwLock<CustomerState>>,
}

impl InMemoryCustomerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a customer record.
    pub fn insert(&self, customer: CustomerSnapshot) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.customers.insert(customer.id, customer);
    }

    /// Makes every lookup fail with `failure` until cleared with `None`.
    pub fn set_failure(&self, failure: Option<RemoteError>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failure = failure;
    }

    /// Returns the number of lookups served.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get_customer(&self, id: ClientId) -> Result<CustomerSnapshot, RemoteError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if let Some(ref failure) = state.failure {
            return Err(failure.clone());
        }

        state
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| classify_status(404, CallSite::Customer))
    }
}

#[derive(Debug, Default)]
struct ProductState {
    products: HashMap<ProductId, ProductSnapshot>,
    failure: Option<RemoteError>,
    failing: HashMap<ProductId, RemoteError>,
    calls: usize,
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<ProductState>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product record.
    pub fn insert(&self, product: ProductSnapshot) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.products.insert(product.id, product);
    }

    /// Changes the stock of a known product.
    pub fn set_stock(&self, id: ProductId, stock: i64) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(product) = state.products.get_mut(&id) {
            product.stock = stock;
        }
    }

    /// Changes the price of a known product.
    pub fn set_price(&self, id: ProductId, price: f64) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(product) = state.products.get_mut(&id) {
            product.price = price;
        }
    }

    /// Makes every lookup fail with `failure` until cleared with `None`.
    pub fn set_failure(&self, failure: Option<RemoteError>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failure = failure;
    }

    /// Makes lookups of one product fail.
    pub fn fail_product(&self, id: ProductId, failure: RemoteError) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failing
            .insert(id, failure);
    }

    /// Returns the number of lookups served.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, id: ProductId) -> Result<ProductSnapshot, RemoteError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if let Some(failure) = state.failure.as_ref().or_else(|| state.failing.get(&id)) {
            return Err(failure.clone());
        }

        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| classify_status(404, CallSite::Product))
    }
}
