//! Order commands.

use serde::{Deserialize, Serialize};

use super::{ClientId, MAX_COMMENT_LENGTH, OrderError, OrderStatus, ProductId};

/// A requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,

    /// Requested quantity. Signed so that malformed input can be reported
    /// instead of failing deserialization.
    pub quantity: i64,
}

impl OrderLineRequest {
    /// Creates a new line request.
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to create a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    /// The customer placing the order. Optional on the wire so that a
    /// missing value is reported by [`CreateOrder::validate`].
    #[serde(default)]
    pub client_id: Option<ClientId>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command with no lines.
    pub fn new(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            comment: None,
            items: Vec::new(),
        }
    }

    /// Adds a requested line.
    pub fn with_item(mut self, product_id: impl Into<ProductId>, quantity: i64) -> Self {
        self.items.push(OrderLineRequest::new(product_id, quantity));
        self
    }

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Checks the request shape before any remote call is made.
    pub fn validate(&self) -> Result<(), OrderError> {
        if !self.client_id.is_some_and(|id| id.is_valid()) {
            return Err(OrderError::ClientIdRequired);
        }

        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for line in &self.items {
            if !line.product_id.is_valid() {
                return Err(OrderError::InvalidProductId {
                    product_id: line.product_id,
                });
            }
            if line.quantity <= 0 || line.quantity > u32::MAX as i64 {
                return Err(OrderError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
        }

        if let Some(comment) = &self.comment {
            let length = comment.chars().count();
            if length > MAX_COMMENT_LENGTH {
                return Err(OrderError::CommentTooLong {
                    length,
                    max: MAX_COMMENT_LENGTH,
                });
            }
        }

        Ok(())
    }
}

/// Command to move an order to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub status: OrderStatus,

    /// Version the caller last read. Omitted to skip the early check.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Command to replace the comment of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeComment {
    #[serde(default)]
    pub comment: Option<String>,
}
