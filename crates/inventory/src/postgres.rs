use std::collections::HashMap;

use async_trait::async_trait;
use common::ProductId;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::Result;
use crate::store::{InventoryStore, InventoryTransaction};

/// PostgreSQL-backed inventory store.
///
/// Row locks are taken with `SELECT ... FOR UPDATE` and held until the
/// enclosing transaction commits or rolls back.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the inventory database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/inventory")
            .run(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction { tx })
    }

    async fn quantity(&self, product_id: &ProductId) -> Result<Option<i64>> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM inventory WHERE product_id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(quantity)
    }

    async fn upsert(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, quantity)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                updated_at = now()
            "#,
        )
        .bind(product_id.as_str())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Transaction over a [`PostgresInventoryStore`].
///
/// Dropping it without committing rolls the database transaction back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryTransaction for PostgresTransaction {
    async fn lock_rows(&mut self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>> {
        let ids: Vec<String> = product_ids.iter().map(|id| id.as_str().to_owned()).collect();

        // Byte-order collation, so rows lock in the same order `ProductId` sorts in.
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM inventory
            WHERE product_id = ANY($1)
            ORDER BY product_id COLLATE "C"
            FOR UPDATE
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<(ProductId, i64)> {
                let product_id: String = row.try_get("product_id")?;
                let quantity: i64 = row.try_get("quantity")?;
                Ok((ProductId::new(product_id), quantity))
            })
            .collect()
    }

    async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<()> {
        sqlx::query("UPDATE inventory SET quantity = $1, updated_at = now() WHERE product_id = $2")
            .bind(quantity)
            .bind(product_id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn increment(&mut self, product_id: &ProductId, by: u32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE inventory SET quantity = quantity + $1, updated_at = now() WHERE product_id = $2",
        )
        .bind(i64::from(by))
        .bind(product_id.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
