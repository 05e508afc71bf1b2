use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::Result;
use crate::store::{InventoryStore, InventoryTransaction};

type Row = Arc<Mutex<i64>>;

/// In-memory inventory store for tests and database-less runs.
///
/// Each product row is guarded by its own mutex; a transaction holds the
/// owned guards of the rows it touched until it commits or is dropped,
/// which gives the same row-level locking as `SELECT ... FOR UPDATE`.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    rows: Arc<RwLock<HashMap<ProductId, Row>>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given stock levels.
    pub fn with_stock<I, P>(stock: I) -> Self
    where
        I: IntoIterator<Item = (P, u32)>,
        P: Into<ProductId>,
    {
        let rows = stock
            .into_iter()
            .map(|(product_id, quantity)| {
                (product_id.into(), Arc::new(Mutex::new(i64::from(quantity))))
            })
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Returns the number of product records.
    pub async fn product_count(&self) -> usize {
        self.rows.read().await.len()
    }

    async fn row(&self, product_id: &ProductId) -> Option<Row> {
        self.rows.read().await.get(product_id).cloned()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(InMemoryTransaction {
            store: self.clone(),
            locked: BTreeMap::new(),
            pending: HashMap::new(),
        })
    }

    async fn quantity(&self, product_id: &ProductId) -> Result<Option<i64>> {
        match self.row(product_id).await {
            Some(row) => Ok(Some(*row.lock().await)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let row = match self.row(product_id).await {
            Some(row) => row,
            None => {
                // Never await a row lock while holding the map's write lock.
                let mut rows = self.rows.write().await;
                if let Some(row) = rows.get(product_id) {
                    row.clone()
                } else {
                    rows.insert(
                        product_id.clone(),
                        Arc::new(Mutex::new(i64::from(quantity))),
                    );
                    return Ok(());
                }
            }
        };
        *row.lock().await = i64::from(quantity);
        Ok(())
    }
}

/// Transaction over an [`InMemoryInventoryStore`].
pub struct InMemoryTransaction {
    store: InMemoryInventoryStore,
    locked: BTreeMap<ProductId, OwnedMutexGuard<i64>>,
    pending: HashMap<ProductId, i64>,
}

impl InMemoryTransaction {
    /// Locks one row if it exists and is not already held by this transaction.
    async fn acquire(&mut self, product_id: &ProductId) -> bool {
        if self.locked.contains_key(product_id) {
            return true;
        }
        let Some(row) = self.store.row(product_id).await else {
            return false;
        };
        let guard = row.lock_owned().await;
        self.locked.insert(product_id.clone(), guard);
        true
    }

    fn current(&self, product_id: &ProductId) -> Option<i64> {
        self.pending
            .get(product_id)
            .copied()
            .or_else(|| self.locked.get(product_id).map(|guard| **guard))
    }
}

#[async_trait]
impl InventoryTransaction for InMemoryTransaction {
    async fn lock_rows(&mut self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>> {
        let mut ordered = product_ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut quantities = HashMap::with_capacity(ordered.len());
        for product_id in ordered {
            if self.acquire(&product_id).await
                && let Some(quantity) = self.current(&product_id)
            {
                quantities.insert(product_id, quantity);
            }
        }
        Ok(quantities)
    }

    async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<()> {
        if self.acquire(product_id).await {
            self.pending.insert(product_id.clone(), quantity);
        }
        Ok(())
    }

    async fn increment(&mut self, product_id: &ProductId, by: u32) -> Result<bool> {
        if !self.acquire(product_id).await {
            return Ok(false);
        }
        let current = self.current(product_id).unwrap_or_default();
        self.pending
            .insert(product_id.clone(), current + i64::from(by));
        Ok(true)
    }

    async fn commit(mut self) -> Result<()> {
        for (product_id, quantity) in self.pending.drain() {
            if let Some(guard) = self.locked.get_mut(&product_id) {
                **guard = quantity;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[tokio::test]
    async fn test_with_stock_and_quantity() {
        let store = InMemoryInventoryStore::with_stock([("p1", 5), ("p2", 0)]);
        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(5));
        assert_eq!(store.quantity(&p("p2")).await.unwrap(), Some(0));
        assert_eq!(store.quantity(&p("missing")).await.unwrap(), None);
        assert_eq!(store.product_count().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_creates_and_overwrites() {
        let store = InMemoryInventoryStore::new();
        store.upsert(&p("p1"), 3).await.unwrap();
        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(3));

        store.upsert(&p("p1"), 7).await.unwrap();
        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_commit_applies_writes() {
        let store = InMemoryInventoryStore::with_stock([("p1", 5)]);

        let mut tx = store.begin().await.unwrap();
        let locked = tx.lock_rows(&[p("p1"), p("missing")]).await.unwrap();
        assert_eq!(locked.get(&p("p1")), Some(&5));
        assert!(!locked.contains_key(&p("missing")));

        tx.set_quantity(&p("p1"), 2).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryInventoryStore::with_stock([("p1", 5)]);

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_rows(&[p("p1")]).await.unwrap();
            tx.set_quantity(&p("p1"), 0).await.unwrap();
        }

        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_increment_missing_row_reports_false() {
        let store = InMemoryInventoryStore::with_stock([("p1", 1)]);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.increment(&p("p1"), 2).await.unwrap());
        assert!(tx.increment(&p("p1"), 2).await.unwrap());
        assert!(!tx.increment(&p("nope"), 2).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(store.quantity(&p("p1")).await.unwrap(), Some(5));
        assert_eq!(store.quantity(&p("nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_transaction_until_commit() {
        let store = InMemoryInventoryStore::with_stock([("p1", 5)]);

        let mut first = store.begin().await.unwrap();
        first.lock_rows(&[p("p1")]).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                let locked = tx.lock_rows(&[p("p1")]).await.unwrap();
                locked[&p("p1")]
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        first.set_quantity(&p("p1"), 1).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(contender.await.unwrap(), 1);
    }
}
