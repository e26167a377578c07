//! Response shapes returned by the orchestrator.

use chrono::{DateTime, Utc};
use common::{Actor, OrderId, OrderItemId, Version};
use domain::{ClientId, Money, Order, OrderItem, OrderStatus, ProductId};
use gateway::{CustomerSnapshot, ProductSnapshot};
use serde::Serialize;
use store::OrderTotals;

/// A persisted order decorated with the current remote records.
///
/// Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: Option<OrderId>,
    pub client_id: ClientId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub comment: Option<String>,
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
    pub version: Version,
    pub created_by: Actor,
    pub updated_by: Actor,
    pub items: Vec<OrderItemView>,
    /// Absent when the customer directory could not be reached.
    pub customer: Option<CustomerSnapshot>,
}

impl OrderView {
    /// Builds a view without any remote data attached.
    pub fn bare(order: &Order) -> Self {
        Self {
            id: order.id(),
            client_id: order.client_id(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            status: order.status(),
            comment: order.comment().map(str::to_string),
            total_amount: order.total_amount(),
            version: order.version(),
            created_by: order.created_by().clone(),
            updated_by: order.updated_by().clone(),
            items: order.items().iter().map(OrderItemView::bare).collect(),
            customer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemView {
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price captured when the order was created.
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,
    #[serde(rename = "line_total_cents")]
    pub line_total: Money,
    /// Current catalog record; absent when the catalog could not be reached.
    pub product: Option<ProductSnapshot>,
}

impl OrderItemView {
    pub fn bare(item: &OrderItem) -> Self {
        Self {
            id: item.id(),
            product_id: item.product_id(),
            product_name: item.product_name().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            line_total: item.line_total(),
            product: None,
        }
    }
}

/// Order figures for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub client_id: ClientId,
    pub order_count: u64,
    #[serde(rename = "total_spent_cents")]
    pub total_spent: Money,
    pub has_active_orders: bool,
}

/// Order figures across all customers.
pub type GlobalStats = OrderTotals;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_serializes_amounts_in_cents() {
        let actor = Actor::new("tester");
        let mut order = Order::new(ClientId::new(1), None, &actor).unwrap();
        order
            .add_item(
                OrderItem::new(ProductId::new(10), "Widget", 2, Money::from_units(50)).unwrap(),
                &actor,
            )
            .unwrap();

        let json = serde_json::to_value(OrderView::bare(&order)).unwrap();
        assert_eq!(json["total_amount_cents"], 10000);
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["items"][0]["unit_price_cents"], 5000);
        assert!(json["customer"].is_null());
        assert!(json["items"][0]["product"].is_null());
    }
}
