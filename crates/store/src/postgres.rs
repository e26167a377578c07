use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{Actor, OrderId, OrderItemId, Version};
use domain::{ClientId, Money, Order, OrderItem, OrderStatus, PersistedOrder, ProductId};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};

use crate::{
    ClientOrderCount, DailyOrderStats, Fetch, OrderQuery, OrderStore, OrderTotals, Page,
    PageRequest, Result, StoreError, UnitOfWork,
};

const ORDER_COLUMNS: &str = "id, client_id, created_at, updated_at, total_amount_cents, status, \
     comment, version, created_by, updated_by";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_header(row: &PgRow) -> Result<PersistedOrder> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(PersistedOrder {
            id: OrderId::new(row.try_get("id")?),
            client_id: ClientId::new(row.try_get("client_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            status,
            comment: row.try_get("comment")?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            version: Version::new(row.try_get("version")?),
            created_by: Actor::new(row.try_get::<String, _>("created_by")?),
            updated_by: Actor::new(row.try_get::<String, _>("updated_by")?),
            items: None,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<(OrderId, OrderItem)> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))?;

        let item = OrderItem::restore(
            OrderItemId::new(row.try_get("id")?),
            ProductId::new(row.try_get("product_id")?),
            row.try_get::<String, _>("product_name")?,
            quantity,
            Money::from_cents(row.try_get("unit_price_cents")?),
            Version::new(row.try_get("version")?),
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok((OrderId::new(row.try_get("order_id")?), item))
    }

    /// Loads the lines of several orders, grouped by order.
    async fn load_items(&self, ids: &[i64]) -> Result<HashMap<OrderId, Vec<OrderItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents, version
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let (order_id, item) = Self::row_to_item(row)?;
            items.entry(order_id).or_default().push(item);
        }
        Ok(items)
    }

    async fn rows_to_orders(&self, rows: Vec<PgRow>, fetch: Fetch) -> Result<Vec<Order>> {
        let headers = rows
            .iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>>>()?;

        if fetch == Fetch::HeaderOnly {
            return Ok(headers.into_iter().map(Order::from_persisted).collect());
        }

        let ids: Vec<i64> = headers.iter().map(|h| h.id.as_i64()).collect();
        let mut items = self.load_items(&ids).await?;

        Ok(headers
            .into_iter()
            .map(|mut header| {
                header.items = Some(items.remove(&header.id).unwrap_or_default());
                Order::from_persisted(header)
            })
            .collect())
    }

    async fn insert_items(
        conn: &mut PgConnection,
        order_id: OrderId,
        items: &[OrderItem],
    ) -> Result<Vec<OrderItemId>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items.iter().filter(|item| item.id().is_none()) {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price_cents, line_total_cents, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(order_id.as_i64())
            .bind(item.product_id().as_i64())
            .bind(item.product_name())
            .bind(item.quantity() as i32)
            .bind(item.unit_price().cents())
            .bind(item.line_total().cents())
            .bind(item.version().as_i64())
            .fetch_one(&mut *conn)
            .await?;
            ids.push(OrderItemId::new(id));
        }
        Ok(ids)
    }

    /// Tells a missing row from a stale version after a guarded write matched nothing.
    async fn version_mismatch(
        conn: &mut PgConnection,
        order_id: OrderId,
        expected: Version,
    ) -> StoreError {
        let actual: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order_id.as_i64())
                .fetch_optional(&mut *conn)
                .await;

        match actual {
            Ok(Some(actual)) => StoreError::Conflict {
                order_id,
                expected,
                actual: Version::new(actual),
            },
            Ok(None) => StoreError::NotFound(order_id),
            Err(e) => StoreError::Database(e),
        }
    }
}

/// Appends the WHERE clause for a query, numbering parameters from `param_count + 1`.
fn push_filters(sql: &mut String, query: &OrderQuery, param_count: &mut usize) {
    sql.push_str(" WHERE 1=1");

    if query.client_id.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND client_id = ${param_count}"));
    }
    if query.statuses.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND status = ANY(${param_count})"));
    }
    if query.product_id.is_some() {
        *param_count += 1;
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM order_items i WHERE i.order_id = orders.id AND i.product_id = ${param_count})"
        ));
    }
    if query.created_from.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND created_at >= ${param_count}"));
    }
    if query.created_to.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND created_at <= ${param_count}"));
    }
}

/// Binds the parameters written by `push_filters`, in the same order.
fn bind_filters<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &OrderQuery,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(client_id) = query.client_id {
        sqlx_query = sqlx_query.bind(client_id.as_i64());
    }
    if let Some(ref statuses) = query.statuses {
        let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        sqlx_query = sqlx_query.bind(names);
    }
    if let Some(product_id) = query.product_id {
        sqlx_query = sqlx_query.bind(product_id.as_i64());
    }
    if let Some(from) = query.created_from {
        sqlx_query = sqlx_query.bind(from);
    }
    if let Some(to) = query.created_to {
        sqlx_query = sqlx_query.bind(to);
    }
    sqlx_query
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, uow, order), fields(actor = %uow.actor(), client_id = %order.client_id()))]
    async fn insert(&self, uow: &UnitOfWork, mut order: Order) -> Result<Order> {
        uow.ensure_writable()?;

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (client_id, created_at, updated_at, total_amount_cents, status, comment, version, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(order.client_id().as_i64())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.total_amount().cents())
        .bind(order.status().as_str())
        .bind(order.comment())
        .bind(Version::initial().as_i64())
        .bind(order.created_by().as_str())
        .bind(order.updated_by().as_str())
        .fetch_one(&mut *tx)
        .await?;

        let order_id = OrderId::new(id);
        let item_ids = Self::insert_items(&mut *tx, order_id, order.items()).await?;

        tx.commit().await?;

        order.mark_persisted(order_id);
        order.assign_item_ids(item_ids);
        order.set_version(Version::initial());
        Ok(order)
    }

    async fn find_by_id(
        &self,
        _uow: &UnitOfWork,
        id: OrderId,
        fetch: Fetch,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.rows_to_orders(vec![row], fetch).await?.pop()),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, uow, order), fields(actor = %uow.actor(), order_id = ?order.id()))]
    async fn update(&self, uow: &UnitOfWork, mut order: Order) -> Result<Order> {
        uow.ensure_writable()?;
        let order_id = order.id().ok_or(StoreError::NotPersisted)?;
        let expected = order.version();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, comment = $2, updated_at = $3, updated_by = $4,
                total_amount_cents = $5, version = version + 1
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(order.status().as_str())
        .bind(order.comment())
        .bind(order.updated_at())
        .bind(order.updated_by().as_str())
        .bind(order.total_amount().cents())
        .bind(order_id.as_i64())
        .bind(expected.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::version_mismatch(&mut *tx, order_id, expected).await);
        }

        if order.items_loaded() {
            let kept: Vec<i64> = order
                .items()
                .iter()
                .filter_map(|item| item.id().map(|id| id.as_i64()))
                .collect();

            sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND NOT (id = ANY($2))")
                .bind(order_id.as_i64())
                .bind(&kept)
                .execute(&mut *tx)
                .await?;

            let item_ids = Self::insert_items(&mut *tx, order_id, order.items()).await?;
            order.assign_item_ids(item_ids);
        }

        tx.commit().await?;

        order.set_version(expected.next());
        Ok(order)
    }

    #[tracing::instrument(skip(self, uow), fields(actor = %uow.actor()))]
    async fn delete(&self, uow: &UnitOfWork, id: OrderId, expected: Version) -> Result<()> {
        uow.ensure_writable()?;

        let mut tx = self.pool.begin().await?;

        // Lines go with the order through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND version = $2")
            .bind(id.as_i64())
            .bind(expected.as_i64())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::version_mismatch(&mut *tx, id, expected).await);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_page(
        &self,
        _uow: &UnitOfWork,
        query: &OrderQuery,
        page: &PageRequest,
        fetch: Fetch,
    ) -> Result<Page<Order>> {
        let mut count_sql = String::from("SELECT COUNT(*) FROM orders");
        let mut param_count = 0;
        push_filters(&mut count_sql, query, &mut param_count);

        let total: i64 = bind_filters(sqlx::query(&count_sql), query)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);

        let direction = page.direction.as_sql();
        sql.push_str(&format!(
            " ORDER BY {} {direction}, id {direction}",
            page.sort.column()
        ));
        sql.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        ));

        let rows = bind_filters(sqlx::query(&sql), query)
            .bind(page.size as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content = self.rows_to_orders(rows, fetch).await?;
        Ok(Page::new(content, page, total as u64))
    }

    async fn find_all(
        &self,
        _uow: &UnitOfWork,
        query: &OrderQuery,
        fetch: Fetch,
    ) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let rows = bind_filters(sqlx::query(&sql), query)
            .fetch_all(&self.pool)
            .await?;

        self.rows_to_orders(rows, fetch).await
    }

    async fn totals(&self, _uow: &UnitOfWork, query: &OrderQuery) -> Result<OrderTotals> {
        let mut sql =
            String::from("SELECT COUNT(*), COALESCE(SUM(total_amount_cents), 0)::BIGINT FROM orders");
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);

        let row = bind_filters(sqlx::query(&sql), query)
            .fetch_one(&self.pool)
            .await?;

        Ok(OrderTotals {
            order_count: row.try_get::<i64, _>(0)? as u64,
            total_amount: Money::from_cents(row.try_get(1)?),
        })
    }

    async fn daily_stats(
        &self,
        _uow: &UnitOfWork,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        client_id: Option<ClientId>,
    ) -> Result<Vec<DailyOrderStats>> {
        let rows = sqlx::query(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(total_amount_cents), 0)::BIGINT AS total_cents
            FROM orders
            WHERE created_at >= $1 AND created_at <= $2
              AND ($3::BIGINT IS NULL OR client_id = $3)
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(client_id.map(|id| id.as_i64()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DailyOrderStats {
                    date: row.try_get::<NaiveDate, _>("day")?,
                    order_count: row.try_get::<i64, _>("order_count")? as u64,
                    total_amount: Money::from_cents(row.try_get("total_cents")?),
                })
            })
            .collect()
    }

    async fn top_clients(&self, _uow: &UnitOfWork, limit: u32) -> Result<Vec<ClientOrderCount>> {
        let rows = sqlx::query(
            r#"
            SELECT client_id,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(total_amount_cents), 0)::BIGINT AS total_cents
            FROM orders
            GROUP BY client_id
            ORDER BY order_count DESC, client_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ClientOrderCount {
                    client_id: ClientId::new(row.try_get("client_id")?),
                    order_count: row.try_get::<i64, _>("order_count")? as u64,
                    total_amount: Money::from_cents(row.try_get("total_cents")?),
                })
            })
            .collect()
    }
}
