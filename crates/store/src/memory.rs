use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{OrderId, OrderItemId, Version};
use domain::{ClientId, Money, Order};
use tokio::sync::RwLock;

use crate::{
    ClientOrderCount, DailyOrderStats, Fetch, OrderQuery, OrderStore, OrderTotals, Page,
    PageRequest, Result, SortDirection, SortField, StoreError, UnitOfWork,
};

#[derive(Default)]
struct State {
    orders: BTreeMap<OrderId, Order>,
    last_order_id: i64,
    last_item_id: i64,
}

impl State {
    fn next_order_id(&mut self) -> OrderId {
        self.last_order_id += 1;
        OrderId::new(self.last_order_id)
    }

    fn next_item_ids(&mut self, count: usize) -> Vec<OrderItemId> {
        (0..count)
            .map(|_| {
                self.last_item_id += 1;
                OrderItemId::new(self.last_item_id)
            })
            .collect()
    }
}

/// In-memory order store implementation.
///
/// Used by tests and by the binary when no database is configured. Orders
/// are kept fully loaded and shaped on the way out according to `Fetch`.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Removes all orders.
    pub async fn clear(&self) {
        self.state.write().await.orders.clear();
    }
}

fn shape(order: &Order, fetch: Fetch) -> Order {
    match fetch {
        Fetch::WithItems => order.clone(),
        Fetch::HeaderOnly => order.without_items(),
    }
}

fn compare(a: &Order, b: &Order, sort: SortField) -> Ordering {
    let primary = match sort {
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::Status => a.status().as_str().cmp(b.status().as_str()),
        SortField::ClientId => a.client_id().cmp(&b.client_id()),
        SortField::TotalAmount => a.total_amount().cmp(&b.total_amount()),
    };
    primary.then_with(|| a.id().cmp(&b.id()))
}

fn sorted<'a>(
    orders: impl Iterator<Item = &'a Order>,
    sort: SortField,
    direction: SortDirection,
) -> Vec<&'a Order> {
    let mut orders: Vec<_> = orders.collect();
    orders.sort_by(|a, b| match direction {
        SortDirection::Asc => compare(a, b, sort),
        SortDirection::Desc => compare(b, a, sort),
    });
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, uow: &UnitOfWork, mut order: Order) -> Result<Order> {
        uow.ensure_writable()?;

        let mut state = self.state.write().await;
        let id = state.next_order_id();
        let item_ids = state.next_item_ids(order.unassigned_item_count());

        order.mark_persisted(id);
        order.assign_item_ids(item_ids);
        order.set_version(Version::initial());
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn find_by_id(
        &self,
        _uow: &UnitOfWork,
        id: OrderId,
        fetch: Fetch,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).map(|order| shape(order, fetch)))
    }

    async fn update(&self, uow: &UnitOfWork, mut order: Order) -> Result<Order> {
        uow.ensure_writable()?;
        let id = order.id().ok_or(StoreError::NotPersisted)?;

        let mut state = self.state.write().await;
        let stored = state.orders.get(&id).ok_or(StoreError::NotFound(id))?;

        if stored.version() != order.version() {
            return Err(StoreError::Conflict {
                order_id: id,
                expected: order.version(),
                actual: stored.version(),
            });
        }

        if order.items_loaded() {
            let item_ids = state.next_item_ids(order.unassigned_item_count());
            order.assign_item_ids(item_ids);
        } else {
            order.restore_items(stored.items().to_vec());
        }

        order.set_version(order.version().next());
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn delete(&self, uow: &UnitOfWork, id: OrderId, expected: Version) -> Result<()> {
        uow.ensure_writable()?;

        let mut state = self.state.write().await;
        let stored = state.orders.get(&id).ok_or(StoreError::NotFound(id))?;

        if stored.version() != expected {
            return Err(StoreError::Conflict {
                order_id: id,
                expected,
                actual: stored.version(),
            });
        }

        state.orders.remove(&id);
        Ok(())
    }

    async fn find_page(
        &self,
        _uow: &UnitOfWork,
        query: &OrderQuery,
        page: &PageRequest,
        fetch: Fetch,
    ) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let matching = sorted(
            state.orders.values().filter(|order| query.matches(order)),
            page.sort,
            page.direction,
        );

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .map(|order| shape(order, fetch))
            .collect();

        Ok(Page::new(content, page, total))
    }

    async fn find_all(
        &self,
        _uow: &UnitOfWork,
        query: &OrderQuery,
        fetch: Fetch,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let matching = sorted(
            state.orders.values().filter(|order| query.matches(order)),
            SortField::CreatedAt,
            SortDirection::Desc,
        );

        Ok(matching
            .into_iter()
            .map(|order| shape(order, fetch))
            .collect())
    }

    async fn totals(&self, _uow: &UnitOfWork, query: &OrderQuery) -> Result<OrderTotals> {
        let state = self.state.read().await;
        let totals = state
            .orders
            .values()
            .filter(|order| query.matches(order))
            .fold(OrderTotals::default(), |mut acc, order| {
                acc.order_count += 1;
                acc.total_amount += order.total_amount();
                acc
            });
        Ok(totals)
    }

    async fn daily_stats(
        &self,
        _uow: &UnitOfWork,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        client_id: Option<ClientId>,
    ) -> Result<Vec<DailyOrderStats>> {
        let query = OrderQuery {
            client_id,
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        };

        let state = self.state.read().await;
        let mut days: BTreeMap<NaiveDate, (u64, Money)> = BTreeMap::new();
        for order in state.orders.values().filter(|order| query.matches(order)) {
            let entry = days
                .entry(order.created_at().date_naive())
                .or_insert((0, Money::zero()));
            entry.0 += 1;
            entry.1 += order.total_amount();
        }

        Ok(days
            .into_iter()
            .map(|(date, (order_count, total_amount))| DailyOrderStats {
                date,
                order_count,
                total_amount,
            })
            .collect())
    }

    async fn top_clients(&self, _uow: &UnitOfWork, limit: u32) -> Result<Vec<ClientOrderCount>> {
        let state = self.state.read().await;
        let mut clients: HashMap<ClientId, (u64, Money)> = HashMap::new();
        for order in state.orders.values() {
            let entry = clients
                .entry(order.client_id())
                .or_insert((0, Money::zero()));
            entry.0 += 1;
            entry.1 += order.total_amount();
        }

        let mut ranked: Vec<_> = clients
            .into_iter()
            .map(|(client_id, (order_count, total_amount))| ClientOrderCount {
                client_id,
                order_count,
                total_amount,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.order_count
                .cmp(&a.order_count)
                .then(a.client_id.cmp(&b.client_id))
        });
        ranked.truncate(limit as usize);

        Ok(ranked)
    }
}
