use common::{OrderId, Version};
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order changed since it was read.
    #[error("Concurrency conflict for order {order_id}: expected version {expected}, found {actual}")]
    Conflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The order was not found in the store.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order was never inserted.
    #[error("Order has not been persisted")]
    NotPersisted,

    /// A write was attempted through a read-only unit of work.
    #[error("Write attempted in a read-only unit of work")]
    ReadOnly,

    /// A persisted row could not be mapped back to the domain.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
