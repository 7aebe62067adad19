//! Product Store capability.
//!
//! The checkout core only needs lookup-by-id and an atomic relative stock
//! decrement; the storage technology behind it is interchangeable.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::Product;

pub mod memory;
pub mod sql;

pub use memory::InMemoryProductStore;
pub use sql::SqlProductStore;

/// Result of a relative stock decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was reduced; `remaining` is the stock after the update (never negative)
    Applied { remaining: u32 },
    /// No product with that id exists; nothing was changed
    UnknownProduct,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// All products in catalog order
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Atomically subtracts `quantity` from the product's stock, clamping at zero.
    ///
    /// Unknown ids are reported, not treated as errors.
    async fn decrement_stock(&self, id: &str, quantity: u32)
        -> Result<StockDecrement, StoreError>;

    /// Inserts or replaces a product record (administrative seeding).
    async fn upsert_product(&self, product: Product) -> Result<(), StoreError>;

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.list_products().await?.is_empty())
    }
}
