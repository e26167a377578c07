use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, Version};
use domain::{ClientId, Order, OrderStatus};

use crate::{
    ClientOrderCount, DailyOrderStats, OrderQuery, OrderTotals, Page, PageRequest, Result,
    StoreError, UnitOfWork,
};

/// How much of an order to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    /// Header row only; the persisted total is kept.
    HeaderOnly,
    /// Header row and all lines.
    #[default]
    WithItems,
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Each call is
/// atomic: an order is inserted, updated, or deleted together with its lines
/// or not at all.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and its lines.
    ///
    /// Assigns the order and line identities and returns the order at
    /// version 0.
    async fn insert(&self, uow: &UnitOfWork, order: Order) -> Result<Order>;

    /// Loads an order. Returns None if it does not exist.
    async fn find_by_id(&self, uow: &UnitOfWork, id: OrderId, fetch: Fetch)
    -> Result<Option<Order>>;

    /// Persists a mutated order.
    ///
    /// Fails with `Conflict` unless the stored version equals `order.version()`.
    /// On success the returned order is at the next version. Lines are
    /// synchronized only when the order was loaded with them.
    async fn update(&self, uow: &UnitOfWork, order: Order) -> Result<Order>;

    /// Removes an order and its lines if it is still at `expected`.
    async fn delete(&self, uow: &UnitOfWork, id: OrderId, expected: Version) -> Result<()>;

    /// Returns one page of matching orders.
    async fn find_page(
        &self,
        uow: &UnitOfWork,
        query: &OrderQuery,
        page: &PageRequest,
        fetch: Fetch,
    ) -> Result<Page<Order>>;

    /// Returns every matching order, newest first.
    async fn find_all(&self, uow: &UnitOfWork, query: &OrderQuery, fetch: Fetch)
    -> Result<Vec<Order>>;

    /// Counts matching orders and sums their totals.
    async fn totals(&self, uow: &UnitOfWork, query: &OrderQuery) -> Result<OrderTotals>;

    /// Per-day counts and amounts for orders created in `[from, to]`.
    async fn daily_stats(
        &self,
        uow: &UnitOfWork,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        client_id: Option<ClientId>,
    ) -> Result<Vec<DailyOrderStats>>;

    /// Customers with the most orders, most first.
    async fn top_clients(&self, uow: &UnitOfWork, limit: u32) -> Result<Vec<ClientOrderCount>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Loads an order, failing with `NotFound` if it does not exist.
    async fn get(&self, uow: &UnitOfWork, id: OrderId, fetch: Fetch) -> Result<Order> {
        self.find_by_id(uow, id, fetch)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Checks if an order exists.
    async fn exists(&self, uow: &UnitOfWork, id: OrderId) -> Result<bool> {
        Ok(self.find_by_id(uow, id, Fetch::HeaderOnly).await?.is_some())
    }

    /// Returns true if the customer has an order that is still in flight.
    async fn has_active_orders(&self, uow: &UnitOfWork, client_id: ClientId) -> Result<bool> {
        let active = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_active)
            .collect();
        let query = OrderQuery::for_client(client_id).statuses(active);
        Ok(self.totals(uow, &query).await?.order_count > 0)
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
