//! Best-effort decoration of persisted orders with current remote records.

use std::collections::{BTreeSet, HashMap};

use domain::{ClientId, Order, OrderItem, ProductId};
use futures_util::stream::{self, StreamExt};
use gateway::{
    CustomerDirectory, CustomerSnapshot, ProductCatalog, ProductSnapshot, ValidationGateway,
};

use crate::view::OrderView;

/// Upper bound on remote lookups in flight for one response.
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Attaches customer and product records to order views.
///
/// Never fails and never touches persisted state: a lookup that fails
/// leaves its attachment empty. Each distinct customer and product is
/// looked up once per response.
pub struct Enricher<'a, C, P> {
    gateway: &'a ValidationGateway<C, P>,
}

impl<'a, C, P> Enricher<'a, C, P>
where
    C: CustomerDirectory,
    P: ProductCatalog,
{
    pub fn new(gateway: &'a ValidationGateway<C, P>) -> Self {
        Self { gateway }
    }

    /// Builds a view, fetching the customer and every product.
    pub async fn view(&self, order: &Order) -> OrderView {
        let customer = self.gateway.fetch_customer(order.client_id()).await;
        self.view_with_customer(order, customer).await
    }

    /// Builds a view around an already known customer record.
    pub async fn view_with_customer(
        &self,
        order: &Order,
        customer: Option<CustomerSnapshot>,
    ) -> OrderView {
        let products = self
            .fetch_products(order.items().iter().map(OrderItem::product_id))
            .await;
        assemble(order, customer, &products)
    }

    /// Builds views for several orders, keeping their order.
    pub async fn views(&self, orders: &[Order]) -> Vec<OrderView> {
        let (customers, products) = tokio::join!(
            self.fetch_customers(orders.iter().map(Order::client_id)),
            self.fetch_products(
                orders
                    .iter()
                    .flat_map(Order::items)
                    .map(OrderItem::product_id)
            ),
        );

        orders
            .iter()
            .map(|order| {
                let customer = customers.get(&order.client_id()).cloned();
                assemble(order, customer, &products)
            })
            .collect()
    }

    async fn fetch_customers(
        &self,
        ids: impl IntoIterator<Item = ClientId>,
    ) -> HashMap<ClientId, CustomerSnapshot> {
        let distinct: BTreeSet<ClientId> = ids.into_iter().collect();
        stream::iter(distinct)
            .map(|id| async move { (id, self.gateway.fetch_customer(id).await) })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .filter_map(|(id, customer)| async move { customer.map(|c| (id, c)) })
            .collect()
            .await
    }

    async fn fetch_products(
        &self,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> HashMap<ProductId, ProductSnapshot> {
        let distinct: BTreeSet<ProductId> = ids.into_iter().collect();
        stream::iter(distinct)
            .map(|id| async move { (id, self.gateway.fetch_product(id).await) })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .filter_map(|(id, product)| async move { product.map(|p| (id, p)) })
            .collect()
            .await
    }
}

fn assemble(
    order: &Order,
    customer: Option<CustomerSnapshot>,
    products: &HashMap<ProductId, ProductSnapshot>,
) -> OrderView {
    let mut view = OrderView::bare(order);
    view.customer = customer;
    for (item, line) in view.items.iter_mut().zip(order.items()) {
        item.product = products.get(&line.product_id()).cloned();
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Actor;
    use domain::Money;
    use gateway::{InMemoryCustomerDirectory, InMemoryProductCatalog, RemoteError};

    fn gateway() -> ValidationGateway<InMemoryCustomerDirectory, InMemoryProductCatalog> {
        let customers = InMemoryCustomerDirectory::new();
        customers.insert(CustomerSnapshot::active(1));
        customers.insert(CustomerSnapshot::active(2));

        let products = InMemoryProductCatalog::new();
        products.insert(ProductSnapshot::new(10, "Keyboard", 50.0, 20));
        products.insert(ProductSnapshot::new(11, "Mouse", 25.0, 5));

        ValidationGateway::new(customers, products)
    }

    fn order(client: i64, products: &[i64]) -> Order {
        let actor = Actor::new("tester");
        let mut order = Order::new(ClientId::new(client), None, &actor).unwrap();
        for &product in products {
            let item = OrderItem::new(ProductId::new(product), "Item", 1, Money::from_units(1))
                .unwrap();
            order.add_item(item, &actor).unwrap();
        }
        order
    }

    #[tokio::test]
    async fn views_look_up_each_record_once() {
        let gateway = gateway();
        let orders: Vec<Order> = (0..30)
            .map(|i| order(1 + i % 2, &[10, 11, 10]))
            .collect();

        let views = Enricher::new(&gateway).views(&orders).await;

        assert_eq!(views.len(), 30);
        assert_eq!(gateway.customers().call_count(), 2);
        assert_eq!(gateway.products().call_count(), 2);
        for (view, order) in views.iter().zip(&orders) {
            assert_eq!(view.client_id, order.client_id());
            assert!(view.customer.is_some());
            assert_eq!(
                view.items[2].product.as_ref().map(|p| p.name.as_str()),
                Some("Keyboard")
            );
        }
    }

    #[tokio::test]
    async fn repeated_product_on_one_order_is_fetched_once() {
        let gateway = gateway();
        gateway
            .products()
            .fail_product(ProductId::new(11), RemoteError::Unavailable);

        let view = Enricher::new(&gateway)
            .view_with_customer(&order(1, &[10, 11, 10]), None)
            .await;

        assert_eq!(gateway.products().call_count(), 2);
        assert!(view.items[0].product.is_some());
        assert!(view.items[1].product.is_none());
        assert!(view.items[2].product.is_some());
    }
}
