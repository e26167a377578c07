//! Order statistics endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use domain::ClientId;
use gateway::{CustomerDirectory, ProductCatalog};
use orchestrator::{ClientOrderCount, ClientStats, DailyOrderStats, GlobalStats};
use store::OrderStore;

use crate::error::ApiError;
use crate::routes::orders::SharedState;
use crate::routes::params::{DailyParams, LimitParams};

const DEFAULT_TOP_CLIENTS: u32 = 10;

/// GET /api/orders/stats
pub async fn global<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
) -> Result<Json<GlobalStats>, ApiError> {
    Ok(Json(state.orchestrator.global_stats().await?))
}

/// GET /api/orders/client/{client_id}/stats
pub async fn client<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Path(client_id): Path<i64>,
) -> Result<Json<ClientStats>, ApiError> {
    let stats = state
        .orchestrator
        .client_stats(ClientId::new(client_id))
        .await?;
    Ok(Json(stats))
}

/// GET /api/orders/stats/daily?from&to
pub async fn daily<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Query(params): Query<DailyParams>,
) -> Result<Json<Vec<DailyOrderStats>>, ApiError> {
    let days = state
        .orchestrator
        .daily_stats(params.from, params.to, params.client_id.map(ClientId::new))
        .await?;
    Ok(Json(days))
}

/// GET /api/orders/stats/top-clients?limit
pub async fn top_clients<S: OrderStore, C: CustomerDirectory, P: ProductCatalog>(
    State(state): SharedState<S, C, P>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ClientOrderCount>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_CLIENTS);
    Ok(Json(state.orchestrator.top_clients(limit).await?))
}
