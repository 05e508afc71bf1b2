//! Inventory reservation service.

use common::{ProductId, StockLine};

use crate::error::{InventoryError, Result};
use crate::store::{InventoryStore, InventoryTransaction};

/// Reserves and releases stock on top of an [`InventoryStore`].
///
/// A reservation is all-or-nothing: every line is checked against the locked
/// quantity and decremented inside one transaction, and the transaction is
/// discarded as soon as one line is missing or short.
pub struct InventoryService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> InventoryService<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves every line of the request, or nothing at all.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn reserve(&self, items: &[StockLine]) -> Result<()> {
        let result = self.try_reserve(items).await;
        match &result {
            Ok(()) => {
                metrics::counter!("inventory_reservations_total", "outcome" => "reserved")
                    .increment(1);
                tracing::info!("inventory reserved");
            }
            Err(e) => {
                metrics::counter!("inventory_reservations_total", "outcome" => e.kind())
                    .increment(1);
                if e.is_business_failure() {
                    tracing::info!(error = %e, "reservation rejected");
                } else {
                    tracing::warn!(error = %e, "reservation failed");
                }
            }
        }
        result
    }

    async fn try_reserve(&self, items: &[StockLine]) -> Result<()> {
        validate(items)?;

        let mut tx = self.store.begin().await?;
        let product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id.clone()).collect();
        let mut locked = tx.lock_rows(&product_ids).await?;

        // Returning early drops `tx`, which discards the transaction.
        for item in items {
            let available = locked
                .get_mut(&item.product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(item.product_id.clone()))?;
            let requested = i64::from(item.quantity);
            if *available < requested {
                return Err(InventoryError::InsufficientInventory {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available: *available,
                });
            }
            *available -= requested;
        }

        for (product_id, quantity) in &locked {
            tx.set_quantity(product_id, *quantity).await?;
        }
        tx.commit().await
    }

    /// Adds every line back to stock.
    ///
    /// This is a compensating action and trusts its caller: it does not check
    /// that a matching reservation was ever made, so releasing the same lines
    /// twice credits the stock twice. Lines naming unknown products are
    /// skipped.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn release(&self, items: &[StockLine]) -> Result<()> {
        validate(items)?;

        let product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id.clone()).collect();

        // Lock every row up front, in the same order reserve does.
        let mut tx = self.store.begin().await?;
        let locked = tx.lock_rows(&product_ids).await?;
        for item in items {
            if !locked.contains_key(&item.product_id)
                || !tx.increment(&item.product_id, item.quantity).await?
            {
                tracing::warn!(product_id = %item.product_id, "release skipped unknown product");
            }
        }
        tx.commit().await?;

        metrics::counter!("inventory_releases_total").increment(1);
        tracing::info!("inventory released");
        Ok(())
    }

    /// Returns the current stock of a product.
    pub async fn quantity(&self, product_id: &ProductId) -> Result<i64> {
        self.store
            .quantity(product_id)
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))
    }

    /// Sets the stock level of a product, creating its record if needed.
    #[tracing::instrument(skip(self))]
    pub async fn stock(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if product_id.is_blank() {
            return Err(InventoryError::Validation(
                "productId must not be empty".to_string(),
            ));
        }
        self.store.upsert(product_id, quantity).await
    }
}

fn validate(items: &[StockLine]) -> Result<()> {
    if items.is_empty() {
        return Err(InventoryError::Validation(
            "at least one product is required".to_string(),
        ));
    }
    for item in items {
        if item.product_id.is_blank() {
            return Err(InventoryError::Validation(
                "productId must not be empty".to_string(),
            ));
        }
        if item.quantity == 0 {
            return Err(InventoryError::Validation(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::InMemoryInventoryStore;

    fn service(stock: &[(&str, u32)]) -> InventoryService<InMemoryInventoryStore> {
        InventoryService::new(InMemoryInventoryStore::with_stock(stock.iter().copied()))
    }

    async fn qty(service: &InventoryService<InMemoryInventoryStore>, id: &str) -> i64 {
        service.quantity(&ProductId::new(id)).await.unwrap()
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let service = service(&[("p1", 5)]);

        service.reserve(&[StockLine::new("p1", 3)]).await.unwrap();

        assert_eq!(qty(&service, "p1").await, 2);
    }

    #[tokio::test]
    async fn test_reserve_exact_quantity_leaves_zero() {
        let service = service(&[("p1", 5)]);

        service.reserve(&[StockLine::new("p1", 5)]).await.unwrap();

        assert_eq!(qty(&service, "p1").await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_inventory_is_rejected() {
        let service = service(&[("p1", 5)]);

        let err = service
            .reserve(&[StockLine::new("p1", 10)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InventoryError::InsufficientInventory {
                requested: 10,
                available: 5,
                ..
            }
        ));
        assert!(err.is_business_failure());
        assert_eq!(qty(&service, "p1").await, 5);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let service = service(&[("p1", 5)]);

        let err = service
            .reserve(&[StockLine::new("ghost", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::ProductNotFound(ref id) if id.as_str() == "ghost"));
    }

    #[tokio::test]
    async fn test_reserve_is_all_or_nothing_on_shortage() {
        let service = service(&[("p1", 5), ("p2", 1)]);

        let result = service
            .reserve(&[StockLine::new("p1", 2), StockLine::new("p2", 3)])
            .await;

        assert!(matches!(
            result,
            Err(InventoryError::InsufficientInventory { .. })
        ));
        assert_eq!(qty(&service, "p1").await, 5);
        assert_eq!(qty(&service, "p2").await, 1);
    }

    #[tokio::test]
    async fn test_reserve_is_all_or_nothing_on_missing_product() {
        let service = service(&[("p1", 5)]);

        let result = service
            .reserve(&[StockLine::new("p1", 2), StockLine::new("ghost", 1)])
            .await;

        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));
        assert_eq!(qty(&service, "p1").await, 5);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_are_cumulative() {
        let service = service(&[("p1", 5)]);

        let result = service
            .reserve(&[StockLine::new("p1", 3), StockLine::new("p1", 3)])
            .await;
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientInventory { available: 2, .. })
        ));
        assert_eq!(qty(&service, "p1").await, 5);

        service
            .reserve(&[StockLine::new("p1", 2), StockLine::new("p1", 3)])
            .await
            .unwrap();
        assert_eq!(qty(&service, "p1").await, 0);
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_and_zero_quantity() {
        let service = service(&[("p1", 5)]);

        assert!(matches!(
            service.reserve(&[]).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            service.reserve(&[StockLine::new("p1", 0)]).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            service.release(&[StockLine::new("", 1)]).await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_release_increments_stock() {
        let service = service(&[("p1", 5)]);

        service.reserve(&[StockLine::new("p1", 2)]).await.unwrap();
        service.release(&[StockLine::new("p1", 2)]).await.unwrap();

        assert_eq!(qty(&service, "p1").await, 5);
    }

    #[tokio::test]
    async fn test_release_twice_double_credits_stock() {
        let service = service(&[("p1", 5)]);
        let lines = [StockLine::new("p1", 2)];

        service.reserve(&lines).await.unwrap();
        service.release(&lines).await.unwrap();
        service.release(&lines).await.unwrap();

        assert_eq!(qty(&service, "p1").await, 7);
    }

    #[tokio::test]
    async fn test_release_without_reservation_still_credits() {
        let service = service(&[("p1", 0)]);

        service.release(&[StockLine::new("p1", 4)]).await.unwrap();

        assert_eq!(qty(&service, "p1").await, 4);
    }

    #[tokio::test]
    async fn test_release_skips_unknown_products() {
        let service = service(&[("p1", 1)]);

        service
            .release(&[StockLine::new("ghost", 3), StockLine::new("p1", 1)])
            .await
            .unwrap();

        assert_eq!(qty(&service, "p1").await, 2);
        assert!(matches!(
            service.quantity(&ProductId::new("ghost")).await,
            Err(InventoryError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stock_seeds_new_product() {
        let service = service(&[]);

        service.stock(&ProductId::new("p9"), 12).await.unwrap();

        assert_eq!(qty(&service, "p9").await, 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_oversell() {
        let service = Arc::new(service(&[("p1", 10)]));

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.reserve(&[StockLine::new("p1", 3)]).await })
            })
            .collect();

        let mut reserved = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => reserved += 1,
                Err(InventoryError::InsufficientInventory { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(reserved, 3);
        assert_eq!(qty(&service, "p1").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_multi_product_requests_do_not_deadlock() {
        let service = Arc::new(service(&[("a", 100), ("b", 100)]));

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let service = service.clone();
                let lines = if i % 2 == 0 {
                    vec![StockLine::new("a", 1), StockLine::new("b", 1)]
                } else {
                    vec![StockLine::new("b", 1), StockLine::new("a", 1)]
                };
                tokio::spawn(async move { service.reserve(&lines).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(qty(&service, "a").await, 50);
        assert_eq!(qty(&service, "b").await, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reserves_and_releases_do_not_deadlock() {
        let service = Arc::new(service(&[("a", 100), ("B", 100)]));

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        service
                            .reserve(&[StockLine::new("a", 1), StockLine::new("B", 1)])
                            .await
                    } else {
                        service
                            .release(&[StockLine::new("B", 1), StockLine::new("a", 1)])
                            .await
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(qty(&service, "a").await, 100);
        assert_eq!(qty(&service, "B").await, 100);
    }
}
