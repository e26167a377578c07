//! Request extractors and query parameter shapes shared by the handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use common::Actor;
use domain::OrderStatus;
use orchestrator::{PageRequest, SortDirection, SortField};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Header carrying the caller identity.
pub const ACTOR_HEADER: &str = "x-actor";

/// Identity used when a request does not name its caller.
pub const DEFAULT_ACTOR: &str = "order-service-system";

/// The caller of a request, read from `x-actor`.
///
/// Names longer than [`Actor::MAX_LENGTH`] characters are rejected.
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ACTOR);

        let length = name.chars().count();
        if length > Actor::MAX_LENGTH {
            return Err(ApiError::BadRequest(format!(
                "{ACTOR_HEADER} is {length} characters long (max {})",
                Actor::MAX_LENGTH
            )));
        }

        Ok(Caller(Actor::new(name)))
    }
}

/// `?page&size&sort&direction`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest::new(
            params.page.unwrap_or(0),
            params.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
        .sorted_by(
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
        )
    }
}

/// `?from&to`, both RFC 3339 timestamps.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// `?from&to&client_id`
#[derive(Debug, Deserialize)]
pub struct DailyParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub client_id: Option<i64>,
}

/// `?limit`
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

/// Body of boolean answers.
#[derive(Debug, Serialize)]
pub struct Flag {
    pub value: bool,
}

pub fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    raw.parse()
        .map_err(|err: domain::UnknownStatus| ApiError::BadRequest(err.to_string()))
}
