//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, Version};
use domain::{ChangeComment, ChangeStatus, ClientId, CreateOrder, ProductId};
use gateway::{CustomerDirectory, ProductCatalog};
use orchestrator::{OrderOrchestrator, OrderView, Page};
use store::OrderStore;

use crate::error::ApiError;
use crate::routes::params::{Caller, Flag, PageParams, RangeParams, parse_status};

/// Shared application state accessible from all handlers.
pub struct AppState<S, C, P>
where
    S: OrderStore,
    C: CustomerDirectory,
    P: ProductCatalog,
{
    pub orchestrator: OrderOrchestrator<S, C, P>,
}

pub type SharedState<S, C, P> = State<Arc<AppState<S, C, P>>>;

/// POST /api/orders: validate and create an order.
#[tracing::instrument(skip(state, request))]
pub async fn create<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Caller(actor): Caller,
    Json(request): Json<CreateOrder>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let view = state.orchestrator.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/orders
pub async fn list<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderView>>, ApiError> {
    Ok(Json(state.orchestrator.find_all(params.into()).await?))
}

/// GET /api/orders/{id}
pub async fn get<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(id): Path<i64>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(state.orchestrator.find_by_id(OrderId::new(id)).await?))
}

/// PUT /api/orders/{id}/status
#[tracing::instrument(skip(state))]
pub async fn update_status<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Caller(actor): Caller,
    Path(id): Path<i64>,
    Json(change): Json<ChangeStatus>,
) -> Result<Json<OrderView>, ApiError> {
    let view = state
        .orchestrator
        .update_status(
            &actor,
            OrderId::new(id),
            change.status,
            change.expected_version.map(Version::new),
        )
        .await?;
    Ok(Json(view))
}

/// PUT /api/orders/{id}/comment
#[tracing::instrument(skip(state, change))]
pub async fn update_comment<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Caller(actor): Caller,
    Path(id): Path<i64>,
    Json(change): Json<ChangeComment>,
) -> Result<Json<OrderView>, ApiError> {
    let view = state
        .orchestrator
        .update_comment(&actor, OrderId::new(id), change.comment)
        .await?;
    Ok(Json(view))
}

/// PUT /api/orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Caller(actor): Caller,
    Path(id): Path<i64>,
) -> Result<Json<OrderView>, ApiError> {
    let view = state
        .orchestrator
        .cancel_order(&actor, OrderId::new(id))
        .await?;
    Ok(Json(view))
}

/// DELETE /api/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Caller(actor): Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .orchestrator
        .delete_order(&actor, OrderId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/orders/{id}/can-modify
pub async fn can_modify<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(id): Path<i64>,
) -> Result<Json<Flag>, ApiError> {
    let value = state.orchestrator.can_modify(OrderId::new(id)).await?;
    Ok(Json(Flag { value }))
}

/// GET /api/orders/{id}/can-cancel
pub async fn can_cancel<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(id): Path<i64>,
) -> Result<Json<Flag>, ApiError> {
    let value = state.orchestrator.can_cancel(OrderId::new(id)).await?;
    Ok(Json(Flag { value }))
}

/// GET /api/orders/client/{client_id}
pub async fn by_client<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(client_id): Path<i64>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let views = state
        .orchestrator
        .find_by_client(ClientId::new(client_id))
        .await?;
    Ok(Json(views))
}

/// GET /api/orders/client/{client_id}/paged
pub async fn by_client_paged<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(client_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderView>>, ApiError> {
    let page = state
        .orchestrator
        .find_by_client_paged(ClientId::new(client_id), params.into())
        .await?;
    Ok(Json(page))
}

/// GET /api/orders/status/{status}
pub async fn by_status<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(status): Path<String>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let status = parse_status(&status)?;
    Ok(Json(state.orchestrator.find_by_status(status).await?))
}

/// GET /api/orders/status/{status}/paged
pub async fn by_status_paged<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(status): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderView>>, ApiError> {
    let status = parse_status(&status)?;
    let page = state
        .orchestrator
        .find_by_status_paged(status, params.into())
        .await?;
    Ok(Json(page))
}

/// GET /api/orders/period?from&to
pub async fn by_period<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Query(range): Query<RangeParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let views = state
        .orchestrator
        .find_by_date_range(range.from, range.to)
        .await?;
    Ok(Json(views))
}

/// GET /api/orders/product/{product_id}
pub async fn by_product<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let views = state
        .orchestrator
        .find_by_product(ProductId::new(product_id))
        .await?;
    Ok(Json(views))
}

/// GET /api/orders/recent
pub async fn recent<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orchestrator.find_recent().await?))
}

/// GET /api/orders/attention
pub async fn attention<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orchestrator.find_needing_attention().await?))
}
