use async_trait::async_trait;
use chrono::Utc;
use common::{LineItem, Money, OrderId, ProductId};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{OrderError, Result};
use crate::model::{Order, OrderStatus};
use crate::store::OrderStore;

/// PostgreSQL-backed order store.
///
/// Headers live in `orders` and line items in `order_line_items`, keyed by
/// their position in the order.
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

    /// Runs the order database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/orders")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    async fn line_items(&self, id: OrderId) -> Result<Vec<LineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, price_cents
            FROM order_line_items
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<LineItem> {
                let product_id: String = row.try_get("product_id")?;
                let quantity: i64 = row.try_get("quantity")?;
                let quantity = u32::try_from(quantity)
                    .map_err(|_| OrderError::Corrupt(format!("line quantity {quantity}")))?;
                Ok(LineItem::new(
                    ProductId::new(product_id),
                    quantity,
                    Money::from_cents(row.try_get("price_cents")?),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, amount_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.user_id)
        .bind(order.amount.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.line_items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| OrderError::Validation("too many line items".to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO order_line_items (order_id, position, product_id, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_str())
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, amount_cents, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.try_get("status")?;
        Ok(Some(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: row.try_get("user_id")?,
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status: status.parse()?,
            line_items: self.line_items(id).await?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order> {
        if !OrderStatus::Pending.can_transition_to(to) {
            let order = self.get(id).await?.ok_or(OrderError::NotFound(id))?;
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        // Only pending orders can move, so the guard is a single conditional update.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = 'pending'
            "#,
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        let order = self.get(id).await?.ok_or(OrderError::NotFound(id))?;

        if result.rows_affected() == 0 {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }
        Ok(order)
    }
}
