//! Remote call outcomes and validation failures.

use domain::{ClientId, ProductId};
use thiserror::Error;

use crate::retry::IsTransient;

/// Which remote resource a call was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    Customer,
    Product,
}

impl CallSite {
    /// Returns the resource name used in messages and metric labels.
    pub fn resource(&self) -> &'static str {
        match self {
            CallSite::Customer => "customer",
            CallSite::Product => "product",
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource())
    }
}

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Bad request")]
    BadRequest,

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// The remote service answered 503.
    #[error("Service unavailable")]
    Unavailable,

    #[error("Unexpected upstream status {status}")]
    Upstream { status: u16 },

    #[error("Request timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body did not match the expected record shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns a short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RemoteError::BadRequest => "bad_request",
            RemoteError::NotFound { .. } => "not_found",
            RemoteError::Unavailable => "unavailable",
            RemoteError::Upstream { .. } => "upstream_error",
            RemoteError::Timeout => "timeout",
            RemoteError::Transport(_) => "transport_error",
            RemoteError::Decode(_) => "decode_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

impl IsTransient for RemoteError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Unavailable | RemoteError::Timeout | RemoteError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Maps a non-success HTTP status to a remote error.
pub fn classify_status(status: u16, site: CallSite) -> RemoteError {
    match status {
        400 => RemoteError::BadRequest,
        404 => RemoteError::NotFound {
            resource: site.resource(),
        },
        503 => RemoteError::Unavailable,
        status => RemoteError::Upstream { status },
    }
}

/// Why a customer cannot place orders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerRejection {
    #[error("customer not found")]
    NotFound,

    #[error("customer is not active (status {status})")]
    Inactive { status: String },

    /// The directory could not be reached; validation fails closed.
    #[error("customer directory unavailable: {0}")]
    RemoteUnavailable(RemoteError),
}

/// Why a product cannot be ordered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductRejection {
    #[error("product not found")]
    NotFound,

    #[error("product is not available")]
    NotAvailable,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: i64 },

    /// The catalog price is not a positive amount of whole cents.
    #[error("invalid catalog price {price}")]
    InvalidPrice { price: f64 },

    /// The line total for the requested quantity is out of range.
    #[error("amount out of range for quantity {quantity}")]
    AmountTooLarge { quantity: u32 },

    /// The catalog could not be reached; validation fails closed.
    #[error("product catalog unavailable: {0}")]
    RemoteUnavailable(RemoteError),
}

/// Validation failures returned by the gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Client {client_id} is not valid: {reason}")]
    ClientInvalid {
        client_id: ClientId,
        reason: CustomerRejection,
    },

    #[error("Product {product_id} is not valid: {reason}")]
    ProductInvalid {
        product_id: ProductId,
        reason: ProductRejection,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            classify_status(400, CallSite::Customer),
            RemoteError::BadRequest
        );
        assert_eq!(
            classify_status(404, CallSite::Customer),
            RemoteError::NotFound {
                resource: "customer"
            }
        );
        assert_eq!(
            classify_status(404, CallSite::Product),
            RemoteError::NotFound {
                resource: "product"
            }
        );
        assert_eq!(
            classify_status(503, CallSite::Product),
            RemoteError::Unavailable
        );
        assert_eq!(
            classify_status(500, CallSite::Product),
            RemoteError::Upstream { status: 500 }
        );
    }

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(RemoteError::Unavailable.is_transient());
        assert!(RemoteError::Timeout.is_transient());
        assert!(RemoteError::Transport("reset".into()).is_transient());
        assert!(!RemoteError::BadRequest.is_transient());
        assert!(
            !RemoteError::NotFound {
                resource: "product"
            }
            .is_transient()
        );
        assert!(!RemoteError::Upstream { status: 500 }.is_transient());
    }

    #[test]
    fn rejection_messages_carry_quantities() {
        let err = GatewayError::ProductInvalid {
            product_id: ProductId::new(10),
            reason: ProductRejection::InsufficientStock {
                requested: 5,
                available: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "Product 10 is not valid: insufficient stock: requested 5, available 2"
        );

        let err = GatewayError::ProductInvalid {
            product_id: ProductId::new(10),
            reason: ProductRejection::InvalidPrice { price: 0.0 },
        };
        assert_eq!(err.to_string(), "Product 10 is not valid: invalid catalog price 0");
    }
}
