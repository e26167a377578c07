//! Order service error types.

use common::{OrderId, Version};
use domain::{ClientId, OrderError, OrderStatus, ProductId};
use gateway::{CustomerRejection, GatewayError, ProductRejection};
use store::StoreError;
use thiserror::Error;

/// How a failure should be reported at a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request cannot be satisfied as sent.
    RequestRejected,
    NotFound,
    /// The order is in a state that forbids the operation.
    Conflict,
    Internal,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// The customer is missing, inactive, or could not be checked.
    #[error("Client {client_id} is not valid: {reason}")]
    ClientInvalid {
        client_id: ClientId,
        reason: CustomerRejection,
    },

    /// A product is missing, unavailable, short on stock, or could not be checked.
    #[error("Product {product_id} is not valid: {reason}")]
    ProductInvalid {
        product_id: ProductId,
        reason: ProductRejection,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order cannot be modified in {status} status")]
    NotModifiable { status: OrderStatus },

    #[error("Order cannot be cancelled in {status} status")]
    NotCancellable { status: OrderStatus },

    /// The order changed since the caller read it.
    #[error("Order {order_id} was modified concurrently: expected version {expected}, found {actual}")]
    Conflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl OrderServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderServiceError::ClientInvalid { .. }
            | OrderServiceError::ProductInvalid { .. }
            | OrderServiceError::Validation(_) => ErrorKind::RequestRejected,
            OrderServiceError::OrderNotFound(_) => ErrorKind::NotFound,
            OrderServiceError::InvalidTransition { .. }
            | OrderServiceError::NotModifiable { .. }
            | OrderServiceError::NotCancellable { .. }
            | OrderServiceError::Conflict { .. } => ErrorKind::Conflict,
            OrderServiceError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Returns a short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OrderServiceError::ClientInvalid { .. } => "client_invalid",
            OrderServiceError::ProductInvalid { .. } => "product_invalid",
            OrderServiceError::OrderNotFound(_) => "not_found",
            OrderServiceError::InvalidTransition { .. } => "invalid_transition",
            OrderServiceError::NotModifiable { .. } => "not_modifiable",
            OrderServiceError::NotCancellable { .. } => "not_cancellable",
            OrderServiceError::Conflict { .. } => "conflict",
            OrderServiceError::Validation(_) => "validation",
            OrderServiceError::Store(_) => "store",
        }
    }
}

impl From<OrderError> for OrderServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, to } => {
                OrderServiceError::InvalidTransition { from, to }
            }
            OrderError::NotModifiable { status } => OrderServiceError::NotModifiable { status },
            OrderError::NotCancellable { status } => OrderServiceError::NotCancellable { status },
            other => OrderServiceError::Validation(other.to_string()),
        }
    }
}

impl From<GatewayError> for OrderServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ClientInvalid { client_id, reason } => {
                OrderServiceError::ClientInvalid { client_id, reason }
            }
            GatewayError::ProductInvalid { product_id, reason } => {
                OrderServiceError::ProductInvalid { product_id, reason }
            }
        }
    }
}

impl From<StoreError> for OrderServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OrderServiceError::OrderNotFound(id),
            StoreError::Conflict {
                order_id,
                expected,
                actual,
            } => OrderServiceError::Conflict {
                order_id,
                expected,
                actual,
            },
            other => OrderServiceError::Store(other),
        }
    }
}

/// Convenience type alias for order service results.
pub type Result<T> = std::result::Result<T, OrderServiceError>;
