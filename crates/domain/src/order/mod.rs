//! Order aggregate and related types.

mod aggregate;
mod commands;
mod status;
mod value_objects;

pub use aggregate::{Order, OrderItem, PersistedOrder};
pub use commands::{ChangeComment, ChangeStatus, CreateOrder, OrderLineRequest};
pub use status::{OrderStatus, UnknownStatus};
pub use value_objects::{ClientId, Money, ProductId};

use thiserror::Error;

/// Maximum length of an order comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Maximum length of a product name kept on an order line, in characters.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 255;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Client ID is required.
    #[error("Client ID is required")]
    ClientIdRequired,

    #[error("Invalid product ID: {product_id}")]
    InvalidProductId { product_id: ProductId },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// A line total or the order total does not fit the amount range.
    #[error("Amount out of range for product {product_id}")]
    AmountOverflow { product_id: ProductId },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// The lifecycle does not allow this move.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order cannot be modified in {status} status")]
    NotModifiable { status: OrderStatus },

    #[error("Order cannot be cancelled in {status} status")]
    NotCancellable { status: OrderStatus },

    /// Item not found in order.
    #[error("Item not found: {product_id}")]
    ItemNotFound { product_id: ProductId },

    #[error("Comment is {length} characters long (max {max})")]
    CommentTooLong { length: usize, max: usize },

    /// The order was fetched without its lines.
    #[error("Order items are not loaded")]
    ItemsNotLoaded,
}
