//! Domain layer for the order service.
//!
//! This crate provides the order aggregate and its rules:
//! - Order and OrderItem with a derived total
//! - OrderStatus lifecycle state machine
//! - Money and remote identifier value objects
//! - Request commands and their shape validation

pub mod order;

pub use order::{
    ChangeComment, ChangeStatus, ClientId, CreateOrder, MAX_COMMENT_LENGTH,
    MAX_PRODUCT_NAME_LENGTH, Money, Order, OrderError, OrderItem, OrderLineRequest, OrderStatus,
    PersistedOrder, ProductId, UnknownStatus,
};
