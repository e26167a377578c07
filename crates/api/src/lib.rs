//! HTTP API server with observability for the order service.
//!
//! Exposes the order use cases as REST endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use gateway::{CustomerDirectory, ProductCatalog, ValidationGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::OrderOrchestrator;
use store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;
use routes::{orders, stats};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C, P>(state: Arc<AppState<S, C, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    P: ProductCatalog + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/orders",
            post(orders::create::<S, C, P>).get(orders::list::<S, C, P>),
        )
        .route("/orders/recent", get(orders::recent::<S, C, P>))
        .route("/orders/attention", get(orders::attention::<S, C, P>))
        .route("/orders/period", get(orders::by_period::<S, C, P>))
        .route("/orders/stats", get(stats::global::<S, C, P>))
        .route("/orders/stats/daily", get(stats::daily::<S, C, P>))
        .route("/orders/stats/top-clients", get(stats::top_clients::<S, C, P>))
        .route(
            "/orders/{id}",
            get(orders::get::<S, C, P>).delete(orders::delete::<S, C, P>),
        )
        .route("/orders/{id}/status", put(orders::update_status::<S, C, P>))
        .route("/orders/{id}/comment", put(orders::update_comment::<S, C, P>))
        .route("/orders/{id}/cancel", put(orders::cancel::<S, C, P>))
        .route("/orders/{id}/can-modify", get(orders::can_modify::<S, C, P>))
        .route("/orders/{id}/can-cancel", get(orders::can_cancel::<S, C, P>))
        .route("/orders/client/{client_id}", get(orders::by_client::<S, C, P>))
        .route(
            "/orders/client/{client_id}/paged",
            get(orders::by_client_paged::<S, C, P>),
        )
        .route("/orders/client/{client_id}/stats", get(stats::client::<S, C, P>))
        .route("/orders/status/{status}", get(orders::by_status::<S, C, P>))
        .route(
            "/orders/status/{status}/paged",
            get(orders::by_status_paged::<S, C, P>),
        )
        .route(
            "/orders/product/{product_id}",
            get(orders::by_product::<S, C, P>),
        );

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the store and the remote directories into the shared state.
pub fn create_state<S, C, P>(store: S, customers: C, products: P) -> Arc<AppState<S, C, P>>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    let gateway = ValidationGateway::new(customers, products);
    Arc::new(AppState {
        orchestrator: OrderOrchestrator::new(store, gateway),
    })
}
