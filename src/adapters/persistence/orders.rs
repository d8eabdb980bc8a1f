//! SQL Order Repository - Concrete Adapter for the OrderRepository Port
//!
//! Orders live in `orders`, their items in `order_items` keyed by the
//! item UUID and ordered by `position`. Every write replaces the full
//! item set of the order inside one transaction, so a stored order never
//! shows a partial item list.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Order, OrderId, OrderItem, OrderSearch, OrderStatus, Page};
use crate::ports::OrderRepository;

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, \
     delivery_address, comment, status, extra_rate, created_at, updated_at";

/// sqlx-backed order storage.
#[derive(Clone)]
pub struct SqlOrderRepository {
    pool: SqlitePool,
}

impl SqlOrderRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT id, offer_id, sku, title, amount, price \
             FROM order_items WHERE order_id = ? ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .context("load order items failed")?;

        rows.iter().map(item_from_row).collect()
    }

    async fn with_items(&self, rows: Vec<SqliteRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut order = order_from_row(row)?;
            if let Some(id) = order.id {
                order.items = self.load_items(id).await?;
            }
            orders.push(order);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for SqlOrderRepository {
    #[instrument(skip(self))]
    async fn find(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find order failed")?;

        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn search(&self, search: &OrderSearch, per_page: u32) -> Result<Page<Order>> {
        let page = search.page.unwrap_or(1).max(1);
        let offset = Page::<Order>::offset(page, per_page);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        push_filters(&mut count, search);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("count orders failed")?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"
        ));
        push_filters(&mut select, search);
        select
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(i64::from(per_page))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).context("page offset out of range")?);
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .context("list orders failed")?;

        let items = self.with_items(rows).await?;
        debug!(total, returned = items.len(), page, "Orders listed");

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            page,
            per_page,
        })
    }

    #[instrument(skip(self, order), fields(items = order.items.len()))]
    async fn insert(&self, order: &Order) -> Result<OrderId> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        let result = sqlx::query(
            "INSERT INTO orders (customer_name, customer_email, customer_phone, \
             delivery_address, comment, status, extra_rate, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.delivery_address)
        .bind(&order.comment)
        .bind(order.status.as_str())
        .bind(order.extra_rate.to_string())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .context("insert order failed")?;

        let id = result.last_insert_rowid();
        write_items(&mut tx, id, &order.items).await?;
        tx.commit().await.context("commit failed")?;

        Ok(id)
    }

    #[instrument(skip(self, order), fields(order_id = ?order.id, items = order.items.len()))]
    async fn update(&self, order: &Order) -> Result<bool> {
        let Some(id) = order.id else {
            anyhow::bail!("cannot update an order that was never inserted");
        };

        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        let result = sqlx::query(
            "UPDATE orders SET customer_name = ?, customer_email = ?, customer_phone = ?, \
             delivery_address = ?, comment = ?, status = ?, extra_rate = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.delivery_address)
        .bind(&order.comment)
        .bind(order.status.as_str())
        .bind(order.extra_rate.to_string())
        .bind(order.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("update order failed")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("clear order items failed")?;
        write_items(&mut tx, id, &order.items).await?;
        tx.commit().await.context("commit failed")?;

        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: OrderId) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete order items failed")?;
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete order failed")?;

        tx.commit().await.context("commit failed")?;
        Ok(result.rows_affected() > 0)
    }

    async fn all_ids(&self) -> Result<Vec<OrderId>> {
        sqlx::query_scalar("SELECT id FROM orders ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("list order ids failed")
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, search: &OrderSearch) {
    if let Some(id) = search.order_id() {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(status) = search.status() {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(customer) = search.customer() {
        let pattern = format!("%{customer}%");
        builder
            .push(" AND (customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

async fn write_items(conn: &mut SqliteConnection, order_id: OrderId, items: &[OrderItem]) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, position, offer_id, sku, title, amount, price) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(order_id)
        .bind(i64::try_from(position).context("too many items")?)
        .bind(item.offer_id)
        .bind(&item.sku)
        .bind(&item.title)
        .bind(i64::from(item.amount))
        .bind(item.price.to_string())
        .execute(&mut *conn)
        .await
        .context("insert order item failed")?;
    }
    Ok(())
}

fn order_from_row(row: &SqliteRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let extra_rate: String = row.try_get("extra_rate")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Order {
        id: Some(row.try_get("id")?),
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        customer_phone: row.try_get("customer_phone")?,
        delivery_address: row.try_get("delivery_address")?,
        comment: row.try_get("comment")?,
        status: OrderStatus::from_str(&status)
            .with_context(|| format!("stored order has unknown status '{status}'"))?,
        extra_rate: Decimal::from_str(&extra_rate).context("stored extra rate is not a decimal")?,
        items: Vec::new(),
        created_at,
        updated_at,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<OrderItem> {
    let id: String = row.try_get("id")?;
    let amount: i64 = row.try_get("amount")?;
    let price: String = row.try_get("price")?;

    Ok(OrderItem {
        id: Uuid::parse_str(&id).context("stored item id is not a uuid")?,
        offer_id: row.try_get("offer_id")?,
        sku: row.try_get("sku")?,
        title: row.try_get("title")?,
        amount: u32::try_from(amount).context("stored item amount out of range")?,
        price: Decimal::from_str(&price).context("stored item price is not a decimal")?,
    })
}
