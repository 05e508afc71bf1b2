use std::collections::HashMap;

use async_trait::async_trait;
use common::ProductId;

use crate::Result;

/// Storage for per-product stock levels.
///
/// Mutations happen through an [`InventoryTransaction`]; the plain read and
/// upsert methods exist for seeding and inspection.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Transaction type handed out by [`InventoryStore::begin`].
    type Transaction: InventoryTransaction;

    /// Starts a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Returns the current quantity of a product, or None if it has no record.
    async fn quantity(&self, product_id: &ProductId) -> Result<Option<i64>>;

    /// Creates or overwrites the stock level of a product.
    async fn upsert(&self, product_id: &ProductId, quantity: u32) -> Result<()>;
}

/// A unit of work over inventory rows.
///
/// Row locks taken by a transaction are held until it is committed or
/// dropped. Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait InventoryTransaction: Send {
    /// Locks the given product rows exclusively and reads their quantities.
    ///
    /// Rows are locked in ascending product id order so that two transactions
    /// locking overlapping sets cannot deadlock. Products without a record are
    /// absent from the returned map.
    async fn lock_rows(&mut self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>>;

    /// Overwrites the quantity of a product row.
    async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<()>;

    /// Adds `by` to the quantity of a product row.
    ///
    /// Returns false if the product has no record (nothing is written).
    async fn increment(&mut self, product_id: &ProductId, by: u32) -> Result<bool>;

    /// Commits all writes and releases the locks.
    async fn commit(self) -> Result<()>;
}
