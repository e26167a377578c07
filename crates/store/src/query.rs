use chrono::{DateTime, Utc};
use domain::{ClientId, Order, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

/// Filter for order lookups.
///
/// Every set criterion must match. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by customer.
    pub client_id: Option<ClientId>,

    /// Filter by status (any of these).
    pub statuses: Option<Vec<OrderStatus>>,

    /// Only orders with at least one line for this product.
    pub product_id: Option<ProductId>,

    /// Filter by orders created at or after this time.
    pub created_from: Option<DateTime<Utc>>,

    /// Filter by orders created at or before this time.
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a single customer.
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    /// Creates a query for a single status.
    pub fn for_status(status: OrderStatus) -> Self {
        Self {
            statuses: Some(vec![status]),
            ..Default::default()
        }
    }

    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Filters by several statuses.
    pub fn statuses(mut self, statuses: Vec<OrderStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn product_id(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Returns true if a fully loaded order satisfies every criterion.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(client_id) = self.client_id
            && order.client_id() != client_id
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&order.status())
        {
            return false;
        }
        if let Some(product_id) = self.product_id
            && !order.contains_product(product_id)
        {
            return false;
        }
        if let Some(from) = self.created_from
            && order.created_at() < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && order.created_at() > to
        {
            return false;
        }
        true
    }
}

/// Column a page is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Status,
    ClientId,
    TotalAmount,
}

impl SortField {
    /// Returns the column name in the `orders` table.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Status => "status",
            SortField::ClientId => "client_id",
            SortField::TotalAmount => "total_amount_cents",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    /// Creates a request sorted newest first. The size is clamped to `1..=MAX_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
            sort: SortField::default(),
            direction: SortDirection::default(),
        }
    }

    pub fn sorted_by(mut self, sort: SortField, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(request.size as u64),
        }
    }

    /// Transforms the content while keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 1_000).size, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::default().size, 10);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let request = PageRequest::default();
        assert_eq!(request.sort, SortField::CreatedAt);
        assert_eq!(request.direction, SortDirection::Desc);
    }

    #[test]
    fn page_counts_total_pages() {
        let page = Page::new(vec![1, 2, 3], &PageRequest::new(0, 3), 7);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], &PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn page_map_keeps_paging() {
        let page = Page::new(vec![1, 2], &PageRequest::new(1, 2), 4).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn sort_field_parses_from_snake_case() {
        let field: SortField = serde_json::from_str("\"total_amount\"").unwrap();
        assert_eq!(field, SortField::TotalAmount);
        assert_eq!(field.column(), "total_amount_cents");
    }
}
