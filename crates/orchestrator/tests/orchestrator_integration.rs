//! Order use cases end to end against in-memory collaborators.

use chrono::{Duration, Utc};
use common::{Actor, OrderId, Version};
use domain::{
    ClientId, CreateOrder, Money, Order, OrderItem, OrderStatus, PersistedOrder, ProductId,
};
use gateway::{
    CustomerRejection, CustomerSnapshot, InMemoryCustomerDirectory, InMemoryProductCatalog,
    ProductRejection, ProductSnapshot, RemoteError, ValidationGateway,
};
use orchestrator::{OrderOrchestrator, OrderServiceError, PageRequest};
use store::{InMemoryOrderStore, OrderStore, UnitOfWork};

type TestOrchestrator =
    OrderOrchestrator<InMemoryOrderStore, InMemoryCustomerDirectory, InMemoryProductCatalog>;

struct Fixture {
    orchestrator: TestOrchestrator,
    store: InMemoryOrderStore,
    customers: InMemoryCustomerDirectory,
    products: InMemoryProductCatalog,
    actor: Actor,
}

fn fixture() -> Fixture {
    let store = InMemoryOrderStore::new();
    let customers = InMemoryCustomerDirectory::new();
    let products = InMemoryProductCatalog::new();

    customers.insert(CustomerSnapshot::active(1).with_name("Ada", "Lovelace"));
    customers.insert(CustomerSnapshot::active(2));
    customers.insert(CustomerSnapshot::active(3).with_status("INACTIVE"));
    products.insert(ProductSnapshot::new(10, "Keyboard", 50.0, 20));
    products.insert(ProductSnapshot::new(11, "Mouse", 25.0, 5));
    products.insert(ProductSnapshot::new(12, "Monitor", 300.0, 0));

    let orchestrator = OrderOrchestrator::new(
        store.clone(),
        ValidationGateway::new(customers.clone(), products.clone()),
    );

    Fixture {
        orchestrator,
        store,
        customers,
        products,
        actor: Actor::new("clerk"),
    }
}

fn sample_request() -> CreateOrder {
    CreateOrder::new(1).with_item(10, 2).with_item(11, 1)
}

async fn place(fx: &Fixture, request: CreateOrder) -> OrderId {
    fx.orchestrator
        .create_order(&fx.actor, request)
        .await
        .unwrap()
        .id
        .unwrap()
}

/// Inserts an order with a chosen creation time and status.
async fn seed(fx: &Fixture, client: i64, status: OrderStatus, age: Duration) -> OrderId {
    let created_at = Utc::now() - age;
    let order = Order::from_persisted(PersistedOrder {
        id: OrderId::new(0),
        client_id: ClientId::new(client),
        created_at,
        updated_at: created_at,
        status,
        comment: None,
        total_amount: Money::zero(),
        version: Version::initial(),
        created_by: fx.actor.clone(),
        updated_by: fx.actor.clone(),
        items: Some(vec![OrderItem::new(
            ProductId::new(10),
            "Keyboard",
            1,
            Money::from_units(50),
        )
        .unwrap()]),
    });

    fx.store
        .insert(&UnitOfWork::read_write(fx.actor.clone()), order)
        .await
        .unwrap()
        .id()
        .unwrap()
}

#[tokio::test]
async fn create_order_prices_lines_from_catalog() {
    let fx = fixture();

    let view = fx
        .orchestrator
        .create_order(&fx.actor, sample_request().with_comment("gift wrap"))
        .await
        .unwrap();

    assert!(view.id.is_some());
    assert_eq!(view.status, OrderStatus::Pending);
    assert_eq!(view.total_amount, Money::from_units(125));
    assert_eq!(view.total_amount.to_string(), "125.00");
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].unit_price, Money::from_units(50));
    assert_eq!(view.items[0].line_total, Money::from_units(100));
    assert_eq!(view.comment.as_deref(), Some("gift wrap"));
    assert_eq!(view.version, Version::initial());
    assert_eq!(view.created_by, fx.actor);
    assert_eq!(
        view.customer.as_ref().and_then(|c| c.first_name.as_deref()),
        Some("Ada")
    );
    assert!(view.items.iter().all(|item| item.product.is_some()));
    assert_eq!(fx.store.order_count().await, 1);
}

#[tokio::test]
async fn inactive_customer_is_rejected_before_any_product_check() {
    let fx = fixture();

    let err = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(3).with_item(10, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderServiceError::ClientInvalid {
            reason: CustomerRejection::Inactive { .. },
            ..
        }
    ));
    assert_eq!(fx.products.call_count(), 0);
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn unknown_customer_is_rejected() {
    let fx = fixture();

    let err = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(99).with_item(10, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderServiceError::ClientInvalid {
            reason: CustomerRejection::NotFound,
            ..
        }
    ));
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn unreachable_directory_fails_closed() {
    let fx = fixture();
    fx.customers.set_failure(Some(RemoteError::Unavailable));

    let err = fx
        .orchestrator
        .create_order(&fx.actor, sample_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderServiceError::ClientInvalid {
            reason: CustomerRejection::RemoteUnavailable(RemoteError::Unavailable),
            ..
        }
    ));
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn one_bad_line_rejects_the_whole_order() {
    let fx = fixture();

    let missing = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(10, 1).with_item(77, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        missing,
        OrderServiceError::ProductInvalid {
            reason: ProductRejection::NotFound,
            ..
        }
    ));

    let short = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(11, 6))
        .await
        .unwrap_err();
    assert!(matches!(
        short,
        OrderServiceError::ProductInvalid {
            reason: ProductRejection::InsufficientStock {
                requested: 6,
                available: 5
            },
            ..
        }
    ));

    let sold_out = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(12, 1))
        .await
        .unwrap_err();
    assert!(matches!(sold_out, OrderServiceError::ProductInvalid { .. }));

    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn free_product_is_rejected() {
    let fx = fixture();
    fx.products.insert(ProductSnapshot::new(20, "Freebie", 0.0, 5));

    let err = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(20, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderServiceError::ProductInvalid {
            reason: ProductRejection::InvalidPrice { .. },
            ..
        }
    ));
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn amount_out_of_range_is_a_product_rejection() {
    let fx = fixture();
    fx.products
        .insert(ProductSnapshot::new(21, "Bulk", 10_000_000_000_000.0, 10_000));

    let line = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(21, 10_000))
        .await
        .unwrap_err();
    assert!(matches!(
        line,
        OrderServiceError::ProductInvalid {
            product_id,
            reason: ProductRejection::AmountTooLarge { quantity: 10_000 },
        } if product_id == ProductId::new(21)
    ));

    // Each line fits on its own but the order total does not.
    let total = fx
        .orchestrator
        .create_order(
            &fx.actor,
            CreateOrder::new(1).with_item(21, 5_000).with_item(21, 5_000),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        total,
        OrderServiceError::ProductInvalid {
            reason: ProductRejection::AmountTooLarge { quantity: 5_000 },
            ..
        }
    ));

    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn listing_looks_up_each_customer_and_product_once() {
    let fx = fixture();
    for _ in 0..5 {
        place(&fx, sample_request()).await;
    }
    let customer_calls = fx.customers.call_count();
    let product_calls = fx.products.call_count();

    let views = fx
        .orchestrator
        .find_by_client(ClientId::new(1))
        .await
        .unwrap();

    assert_eq!(views.len(), 5);
    assert!(views.iter().all(|v| v.customer.is_some()));
    assert_eq!(fx.customers.call_count() - customer_calls, 1);
    assert_eq!(fx.products.call_count() - product_calls, 2);
}

#[tokio::test]
async fn malformed_request_makes_no_remote_calls() {
    let fx = fixture();

    let empty = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1))
        .await
        .unwrap_err();
    assert!(matches!(empty, OrderServiceError::Validation(_)));

    let zero = fx
        .orchestrator
        .create_order(&fx.actor, CreateOrder::new(1).with_item(10, 0))
        .await
        .unwrap_err();
    assert!(matches!(zero, OrderServiceError::Validation(_)));

    let long_comment = fx
        .orchestrator
        .create_order(&fx.actor, sample_request().with_comment("x".repeat(501)))
        .await
        .unwrap_err();
    assert!(matches!(long_comment, OrderServiceError::Validation(_)));

    let mut anonymous = sample_request();
    anonymous.client_id = None;
    let anonymous = fx
        .orchestrator
        .create_order(&fx.actor, anonymous)
        .await
        .unwrap_err();
    assert!(matches!(anonymous, OrderServiceError::Validation(_)));

    assert_eq!(fx.customers.call_count(), 0);
    assert_eq!(fx.products.call_count(), 0);
}

#[tokio::test]
async fn persisted_price_is_the_snapshot_taken_at_creation() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;

    fx.products.set_price(ProductId::new(10), 80.0);

    let view = fx.orchestrator.find_by_id(id).await.unwrap();
    let keyboard = &view.items[0];
    assert_eq!(keyboard.unit_price, Money::from_units(50));
    assert_eq!(view.total_amount, Money::from_units(125));
    assert_eq!(keyboard.product.as_ref().map(|p| p.price), Some(80.0));
}

#[tokio::test]
async fn enrichment_failure_leaves_attachments_empty() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;

    fx.customers.set_failure(Some(RemoteError::Timeout));
    fx.products
        .fail_product(ProductId::new(11), RemoteError::Unavailable);

    let view = fx.orchestrator.find_by_id(id).await.unwrap();
    assert!(view.customer.is_none());
    assert!(view.items[0].product.is_some());
    assert!(view.items[1].product.is_none());
    assert_eq!(view.total_amount, Money::from_units(125));
}

#[tokio::test]
async fn find_by_id_reports_missing_orders() {
    let fx = fixture();

    let err = fx.orchestrator.find_by_id(OrderId::new(42)).await.unwrap_err();
    assert!(matches!(err, OrderServiceError::OrderNotFound(id) if id == OrderId::new(42)));
}

#[tokio::test]
async fn status_follows_the_lifecycle() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;

    let err = fx
        .orchestrator
        .update_status(&fx.actor, id, OrderStatus::Processing, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Processing
        }
    ));

    let shipper = Actor::new("shipper");
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let view = fx
            .orchestrator
            .update_status(&shipper, id, status, None)
            .await
            .unwrap();
        assert_eq!(view.status, status);
    }

    let view = fx.orchestrator.find_by_id(id).await.unwrap();
    assert_eq!(view.version, Version::new(4));
    assert_eq!(view.updated_by, shipper);
    assert_eq!(view.created_by, fx.actor);

    let err = fx
        .orchestrator
        .update_status(&fx.actor, id, OrderStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn stale_expected_version_is_a_conflict() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;

    fx.orchestrator
        .update_status(&fx.actor, id, OrderStatus::Confirmed, Some(Version::new(0)))
        .await
        .unwrap();

    let err = fx
        .orchestrator
        .update_status(&fx.actor, id, OrderStatus::Processing, Some(Version::new(0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::Conflict { expected, actual, .. }
            if expected == Version::new(0) && actual == Version::new(1)
    ));
}

#[tokio::test]
async fn concurrent_updates_from_one_version_let_exactly_one_win() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;
    let expected = Some(Version::initial());

    let (first, second) = tokio::join!(
        fx.orchestrator
            .update_status(&fx.actor, id, OrderStatus::Confirmed, expected),
        fx.orchestrator
            .update_status(&fx.actor, id, OrderStatus::Cancelled, expected),
    );

    let results = [first, second];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(OrderServiceError::Conflict { .. })))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    let view = fx.orchestrator.find_by_id(id).await.unwrap();
    assert_eq!(view.version, Version::new(1));
}

#[tokio::test]
async fn cancel_depends_on_status() {
    let fx = fixture();
    let pending = place(&fx, sample_request()).await;
    let delivered = seed(&fx, 1, OrderStatus::Delivered, Duration::hours(1)).await;

    assert!(fx.orchestrator.can_cancel(pending).await.unwrap());
    assert!(!fx.orchestrator.can_cancel(delivered).await.unwrap());

    let view = fx.orchestrator.cancel_order(&fx.actor, pending).await.unwrap();
    assert_eq!(view.status, OrderStatus::Cancelled);

    let err = fx
        .orchestrator
        .cancel_order(&fx.actor, delivered)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::NotCancellable {
            status: OrderStatus::Delivered
        }
    ));
}

#[tokio::test]
async fn comment_changes_only_while_modifiable() {
    let fx = fixture();
    let id = place(&fx, sample_request()).await;

    let view = fx
        .orchestrator
        .update_comment(&fx.actor, id, Some("leave at door".to_string()))
        .await
        .unwrap();
    assert_eq!(view.comment.as_deref(), Some("leave at door"));
    assert_eq!(view.items.len(), 2);

    let cleared = fx
        .orchestrator
        .update_comment(&fx.actor, id, None)
        .await
        .unwrap();
    assert!(cleared.comment.is_none());

    let shipped = seed(&fx, 1, OrderStatus::Shipped, Duration::hours(1)).await;
    assert!(!fx.orchestrator.can_modify(shipped).await.unwrap());
    let err = fx
        .orchestrator
        .update_comment(&fx.actor, shipped, Some("too late".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderServiceError::NotModifiable { .. }));
}

#[tokio::test]
async fn delete_depends_on_status() {
    let fx = fixture();
    let pending = place(&fx, sample_request()).await;
    let shipped = seed(&fx, 1, OrderStatus::Shipped, Duration::hours(1)).await;

    let err = fx
        .orchestrator
        .delete_order(&fx.actor, shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::NotModifiable {
            status: OrderStatus::Shipped
        }
    ));

    fx.orchestrator
        .delete_order(&fx.actor, pending)
        .await
        .unwrap();
    assert!(matches!(
        fx.orchestrator.find_by_id(pending).await,
        Err(OrderServiceError::OrderNotFound(_))
    ));
    assert_eq!(fx.store.order_count().await, 1);
}

#[tokio::test]
async fn lookups_filter_orders() {
    let fx = fixture();
    let first = place(&fx, sample_request()).await;
    let second = place(&fx, CreateOrder::new(2).with_item(11, 1)).await;
    fx.orchestrator
        .update_status(&fx.actor, second, OrderStatus::Confirmed, None)
        .await
        .unwrap();

    let by_client = fx
        .orchestrator
        .find_by_client(ClientId::new(1))
        .await
        .unwrap();
    assert_eq!(by_client.len(), 1);
    assert_eq!(by_client[0].id, Some(first));

    let confirmed = fx
        .orchestrator
        .find_by_status(OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, Some(second));

    let with_keyboard = fx
        .orchestrator
        .find_by_product(ProductId::new(10))
        .await
        .unwrap();
    assert_eq!(with_keyboard.len(), 1);

    let with_mouse = fx
        .orchestrator
        .find_by_product(ProductId::new(11))
        .await
        .unwrap();
    assert_eq!(with_mouse.len(), 2);
}

#[tokio::test]
async fn recent_and_attention_use_creation_age() {
    let fx = fixture();
    let fresh = place(&fx, sample_request()).await;
    let stale_pending = seed(&fx, 1, OrderStatus::Pending, Duration::days(5)).await;
    let stale_confirmed = seed(&fx, 2, OrderStatus::Confirmed, Duration::days(4)).await;
    seed(&fx, 2, OrderStatus::Shipped, Duration::days(6)).await;

    let recent = fx.orchestrator.find_recent().await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, Some(fresh));

    let attention = fx.orchestrator.find_needing_attention().await.unwrap();
    let ids: Vec<_> = attention.iter().filter_map(|view| view.id).collect();
    assert_eq!(ids, vec![stale_confirmed, stale_pending]);
}

#[tokio::test]
async fn date_range_must_be_ordered() {
    let fx = fixture();
    place(&fx, sample_request()).await;
    seed(&fx, 1, OrderStatus::Pending, Duration::days(10)).await;

    let now = Utc::now();
    let in_range = fx
        .orchestrator
        .find_by_date_range(now - Duration::days(1), now + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(in_range.len(), 1);

    let err = fx
        .orchestrator
        .find_by_date_range(now, now - Duration::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderServiceError::Validation(_)));
}

#[tokio::test]
async fn paged_listing_reports_totals() {
    let fx = fixture();
    for _ in 0..5 {
        place(&fx, CreateOrder::new(1).with_item(10, 1)).await;
    }
    place(&fx, CreateOrder::new(2).with_item(10, 1)).await;

    let page = fx.orchestrator.find_all(PageRequest::new(1, 4)).await.unwrap();
    assert_eq!(page.total_elements, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.content.len(), 2);

    let client_page = fx
        .orchestrator
        .find_by_client_paged(ClientId::new(1), PageRequest::new(0, 2))
        .await
        .unwrap();
    assert_eq!(client_page.total_elements, 5);
    assert_eq!(client_page.content.len(), 2);
    assert!(client_page.content[0].created_at >= client_page.content[1].created_at);

    let pending = fx
        .orchestrator
        .find_by_status_paged(OrderStatus::Pending, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(pending.total_elements, 6);
}

#[tokio::test]
async fn statistics_sum_persisted_totals() {
    let fx = fixture();
    place(&fx, sample_request()).await;
    place(&fx, CreateOrder::new(1).with_item(11, 2)).await;
    let other = place(&fx, CreateOrder::new(2).with_item(10, 1)).await;
    fx.orchestrator
        .cancel_order(&fx.actor, other)
        .await
        .unwrap();

    let client = fx.orchestrator.client_stats(ClientId::new(1)).await.unwrap();
    assert_eq!(client.order_count, 2);
    assert_eq!(client.total_spent, Money::from_units(175));
    assert!(client.has_active_orders);

    let idle = fx.orchestrator.client_stats(ClientId::new(2)).await.unwrap();
    assert_eq!(idle.order_count, 1);
    assert!(!idle.has_active_orders);

    let global = fx.orchestrator.global_stats().await.unwrap();
    assert_eq!(global.order_count, 3);
    assert_eq!(global.total_amount, Money::from_units(225));

    let top = fx.orchestrator.top_clients(1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].client_id, ClientId::new(1));
    assert_eq!(top[0].order_count, 2);

    let now = Utc::now();
    let daily = fx
        .orchestrator
        .daily_stats(now - Duration::days(1), now + Duration::minutes(1), None)
        .await
        .unwrap();
    assert_eq!(daily.iter().map(|day| day.order_count).sum::<u64>(), 3);

    assert!(matches!(
        fx.orchestrator.top_clients(0).await,
        Err(OrderServiceError::Validation(_))
    ));
}
