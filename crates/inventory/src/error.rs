use common::ProductId;
use thiserror::Error;

/// Errors that can occur when reserving or releasing inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The request itself is malformed (empty, zero quantity, blank product).
    #[error("Invalid inventory request: {0}")]
    Validation(String),

    /// A referenced product has no inventory record.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The locked quantity is lower than the requested quantity.
    #[error(
        "Insufficient inventory for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl InventoryError {
    /// Returns true for business-rule rejections, as opposed to infrastructure failures.
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            InventoryError::ProductNotFound(_) | InventoryError::InsufficientInventory { .. }
        )
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::Validation(_) => "invalid",
            InventoryError::ProductNotFound(_) => "not_found",
            InventoryError::InsufficientInventory { .. } => "insufficient",
            InventoryError::Database(_) | InventoryError::Migration(_) => "database",
        }
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
