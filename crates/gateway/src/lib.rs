//! Remote validation gateway.
//!
//! Wraps the customer directory and the product catalog behind two seams,
//! maps HTTP outcomes to [`RemoteError`], and turns lookups into validation
//! answers for order creation.

pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod model;
pub mod retry;

pub use config::GatewayConfig;
pub use directory::{CustomerDirectory, ProductCatalog};
pub use error::{
    CallSite, CustomerRejection, GatewayError, ProductRejection, RemoteError, classify_status,
};
pub use gateway::ValidationGateway;
pub use http::{HttpCustomerDirectory, HttpProductCatalog};
pub use memory::{InMemoryCustomerDirectory, InMemoryProductCatalog};
pub use model::{CustomerSnapshot, ProductSnapshot};
pub use retry::{IsTransient, RetryPolicy, retry_on_transient};
