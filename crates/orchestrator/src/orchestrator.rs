//! Order use cases.

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use common::{Actor, OrderId, Version};
use domain::{ClientId, CreateOrder, Order, OrderError, OrderItem, OrderStatus, ProductId};
use gateway::{CustomerDirectory, ProductCatalog, ProductRejection, ValidationGateway};
use store::{
    ClientOrderCount, DailyOrderStats, Fetch, OrderQuery, OrderStore, OrderStoreExt, Page,
    PageRequest, UnitOfWork,
};

use crate::enricher::Enricher;
use crate::error::{OrderServiceError, Result};
use crate::view::{ClientStats, GlobalStats, OrderView};

/// Identity recorded on read-only units of work.
const READER: &str = "order-reader";

/// How far back `find_recent` looks.
const RECENT_WINDOW_HOURS: i64 = 24;

/// Age after which an unshipped order needs attention.
const ATTENTION_AGE_DAYS: i64 = 3;

const MAX_TOP_CLIENTS: u32 = 100;

/// Sequences remote validation, persistence, and enrichment for orders.
///
/// Validation of a new order fully precedes persistence. Nothing is
/// reserved remotely: stock is read-checked only, so two concurrent orders
/// can both pass the check for the last units.
pub struct OrderOrchestrator<S, C, P>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    store: S,
    gateway: ValidationGateway<C, P>,
}

impl<S, C, P> OrderOrchestrator<S, C, P>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    /// Creates a new orchestrator.
    pub fn new(store: S, gateway: ValidationGateway<C, P>) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &ValidationGateway<C, P> {
        &self.gateway
    }

    fn enricher(&self) -> Enricher<'_, C, P> {
        Enricher::new(&self.gateway)
    }

    fn reader() -> UnitOfWork {
        UnitOfWork::read_only(Actor::new(READER))
    }

    /// Validates and persists a new order in `PENDING`.
    ///
    /// Fails without persisting anything if the customer or any product is
    /// rejected.
    #[tracing::instrument(skip(self, request), fields(%actor, client_id = ?request.client_id))]
    pub async fn create_order(&self, actor: &Actor, request: CreateOrder) -> Result<OrderView> {
        let started = Instant::now();
        let result = self.place_order(actor, request).await;

        match &result {
            Ok(view) => {
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("order_creation_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = ?view.id,
                    total = %view.total_amount,
                    items = view.items.len(),
                    "order created"
                );
            }
            Err(err) => {
                metrics::counter!("order_creation_rejected_total", "reason" => err.label())
                    .increment(1);
                tracing::info!(error = %err, "order rejected");
            }
        }

        result
    }

    async fn place_order(&self, actor: &Actor, request: CreateOrder) -> Result<OrderView> {
        request.validate()?;
        let client_id = request.client_id.ok_or(OrderError::ClientIdRequired)?;

        let customer = self.gateway.validate_customer(client_id).await?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let quantity = u32::try_from(line.quantity).map_err(|_| {
                OrderServiceError::Validation(format!("Invalid quantity: {}", line.quantity))
            })?;
            let product = self
                .gateway
                .validate_product(line.product_id, quantity)
                .await?;
            let unit_price = product.sellable_price().ok_or_else(|| {
                OrderServiceError::ProductInvalid {
                    product_id: line.product_id,
                    reason: ProductRejection::InvalidPrice {
                        price: product.price,
                    },
                }
            })?;
            let item = OrderItem::new(line.product_id, product.name, quantity, unit_price)
                .map_err(|err| line_rejected(err, quantity))?;
            items.push(item);
        }

        let mut order = Order::new(client_id, request.comment, actor)?;
        for item in items {
            let quantity = item.quantity();
            order
                .add_item(item, actor)
                .map_err(|err| line_rejected(err, quantity))?;
        }

        let uow = UnitOfWork::read_write(actor.clone());
        let order = self.store.insert(&uow, order).await?;

        Ok(self
            .enricher()
            .view_with_customer(&order, Some(customer))
            .await)
    }

    /// Moves an order to `status`.
    ///
    /// With `expected_version`, fails with `Conflict` unless the order is
    /// still at that version.
    #[tracing::instrument(skip(self), fields(%actor))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        status: OrderStatus,
        expected_version: Option<Version>,
    ) -> Result<OrderView> {
        let uow = UnitOfWork::read_write(actor.clone());
        let mut order = self.store.get(&uow, order_id, Fetch::WithItems).await?;

        if let Some(expected) = expected_version
            && expected != order.version()
        {
            return Err(OrderServiceError::Conflict {
                order_id,
                expected,
                actual: order.version(),
            });
        }

        let from = order.status();
        order.transition_to(status, actor)?;
        let order = self.store.update(&uow, order).await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => from.as_str(),
            "to" => status.as_str()
        )
        .increment(1);
        tracing::info!(%from, to = %status, version = %order.version(), "order status changed");

        Ok(self.enricher().view(&order).await)
    }

    /// Replaces the comment of a modifiable order.
    #[tracing::instrument(skip(self, comment), fields(%actor))]
    pub async fn update_comment(
        &self,
        actor: &Actor,
        order_id: OrderId,
        comment: Option<String>,
    ) -> Result<OrderView> {
        let uow = UnitOfWork::read_write(actor.clone());
        let mut order = self.store.get(&uow, order_id, Fetch::WithItems).await?;

        order.update_comment(comment, actor)?;
        let order = self.store.update(&uow, order).await?;

        tracing::info!("order comment updated");
        Ok(self.enricher().view(&order).await)
    }

    /// Cancels an order that has not been delivered.
    #[tracing::instrument(skip(self), fields(%actor))]
    pub async fn cancel_order(&self, actor: &Actor, order_id: OrderId) -> Result<OrderView> {
        let uow = UnitOfWork::read_write(actor.clone());
        let mut order = self.store.get(&uow, order_id, Fetch::WithItems).await?;

        let from = order.status();
        order.cancel(actor)?;
        let order = self.store.update(&uow, order).await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => from.as_str(),
            "to" => OrderStatus::Cancelled.as_str()
        )
        .increment(1);
        tracing::info!(%from, "order cancelled");

        Ok(self.enricher().view(&order).await)
    }

    /// Removes a modifiable order and its lines.
    #[tracing::instrument(skip(self), fields(%actor))]
    pub async fn delete_order(&self, actor: &Actor, order_id: OrderId) -> Result<()> {
        let uow = UnitOfWork::read_write(actor.clone());
        let order = self.store.get(&uow, order_id, Fetch::HeaderOnly).await?;

        order.ensure_deletable()?;
        self.store.delete(&uow, order_id, order.version()).await?;

        tracing::info!("order deleted");
        Ok(())
    }

    /// Returns true if the comment may change and the order may be deleted.
    pub async fn can_modify(&self, order_id: OrderId) -> Result<bool> {
        let order = self.load_header(order_id).await?;
        Ok(order.can_be_modified())
    }

    /// Returns true if the order may be cancelled.
    pub async fn can_cancel(&self, order_id: OrderId) -> Result<bool> {
        let order = self.load_header(order_id).await?;
        Ok(order.can_be_cancelled())
    }

    async fn load_header(&self, order_id: OrderId) -> Result<Order> {
        Ok(self
            .store
            .get(&Self::reader(), order_id, Fetch::HeaderOnly)
            .await?)
    }
}

// Reads
impl<S, C, P> OrderOrchestrator<S, C, P>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    pub async fn find_by_id(&self, order_id: OrderId) -> Result<OrderView> {
        let order = self
            .store
            .get(&Self::reader(), order_id, Fetch::WithItems)
            .await?;
        Ok(self.enricher().view(&order).await)
    }

    /// Returns one page of all orders.
    pub async fn find_all(&self, page: PageRequest) -> Result<Page<OrderView>> {
        self.find_page(OrderQuery::new(), page).await
    }

    /// Returns the orders of a customer, newest first.
    pub async fn find_by_client(&self, client_id: ClientId) -> Result<Vec<OrderView>> {
        self.find_list(OrderQuery::for_client(client_id)).await
    }

    pub async fn find_by_client_paged(
        &self,
        client_id: ClientId,
        page: PageRequest,
    ) -> Result<Page<OrderView>> {
        self.find_page(OrderQuery::for_client(client_id), page).await
    }

    /// Returns the orders in a status, newest first.
    pub async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<OrderView>> {
        self.find_list(OrderQuery::for_status(status)).await
    }

    pub async fn find_by_status_paged(
        &self,
        status: OrderStatus,
        page: PageRequest,
    ) -> Result<Page<OrderView>> {
        self.find_page(OrderQuery::for_status(status), page).await
    }

    /// Returns the orders created in `[from, to]`, newest first.
    pub async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderView>> {
        check_range(from, to)?;
        self.find_list(OrderQuery::new().created_from(from).created_to(to))
            .await
    }

    /// Returns the orders with a line for the product, newest first.
    pub async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<OrderView>> {
        self.find_list(OrderQuery::new().product_id(product_id))
            .await
    }

    /// Returns the orders created in the last 24 hours.
    pub async fn find_recent(&self) -> Result<Vec<OrderView>> {
        let since = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);
        self.find_list(OrderQuery::new().created_from(since)).await
    }

    /// Returns pending or confirmed orders older than three days.
    pub async fn find_needing_attention(&self) -> Result<Vec<OrderView>> {
        let before = Utc::now() - Duration::days(ATTENTION_AGE_DAYS);
        let query = OrderQuery::new()
            .statuses(vec![OrderStatus::Pending, OrderStatus::Confirmed])
            .created_to(before);
        self.find_list(query).await
    }

    async fn find_list(&self, query: OrderQuery) -> Result<Vec<OrderView>> {
        let orders = self
            .store
            .find_all(&Self::reader(), &query, Fetch::WithItems)
            .await?;
        Ok(self.enricher().views(&orders).await)
    }

    async fn find_page(&self, query: OrderQuery, page: PageRequest) -> Result<Page<OrderView>> {
        let orders = self
            .store
            .find_page(&Self::reader(), &query, &page, Fetch::WithItems)
            .await?;

        let views = self.enricher().views(&orders.content).await;
        Ok(Page {
            content: views,
            page: orders.page,
            size: orders.size,
            total_elements: orders.total_elements,
            total_pages: orders.total_pages,
        })
    }
}

// Statistics
impl<S, C, P> OrderOrchestrator<S, C, P>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    /// Returns order count, total spend, and whether the customer has orders in flight.
    pub async fn client_stats(&self, client_id: ClientId) -> Result<ClientStats> {
        let uow = Self::reader();
        let totals = self
            .store
            .totals(&uow, &OrderQuery::for_client(client_id))
            .await?;
        let has_active_orders = self.store.has_active_orders(&uow, client_id).await?;

        Ok(ClientStats {
            client_id,
            order_count: totals.order_count,
            total_spent: totals.total_amount,
            has_active_orders,
        })
    }

    pub async fn global_stats(&self) -> Result<GlobalStats> {
        Ok(self
            .store
            .totals(&Self::reader(), &OrderQuery::new())
            .await?)
    }

    /// Per-day figures for orders created in `[from, to]`.
    pub async fn daily_stats(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        client_id: Option<ClientId>,
    ) -> Result<Vec<DailyOrderStats>> {
        check_range(from, to)?;
        Ok(self
            .store
            .daily_stats(&Self::reader(), from, to, client_id)
            .await?)
    }

    /// Customers with the most orders.
    pub async fn top_clients(&self, limit: u32) -> Result<Vec<ClientOrderCount>> {
        if limit == 0 || limit > MAX_TOP_CLIENTS {
            return Err(OrderServiceError::Validation(format!(
                "limit must be between 1 and {MAX_TOP_CLIENTS}"
            )));
        }
        Ok(self.store.top_clients(&Self::reader(), limit).await?)
    }
}

/// Reports an amount overflow on a line as a rejection of its product.
fn line_rejected(err: OrderError, quantity: u32) -> OrderServiceError {
    match err {
        OrderError::AmountOverflow { product_id } => OrderServiceError::ProductInvalid {
            product_id,
            reason: ProductRejection::AmountTooLarge { quantity },
        },
        other => other.into(),
    }
}

fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
    if from > to {
        return Err(OrderServiceError::Validation(format!(
            "range start {from} is after range end {to}"
        )));
    }
    Ok(())
}
