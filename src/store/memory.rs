use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::{ProductStore, StockDecrement};
use crate::errors::StoreError;
use crate::models::Product;

#[derive(Debug)]
struct Slot {
    position: u64,
    product: Product,
}

/// Process-local product table.
///
/// Every mutation goes through a single `DashMap` entry guard, so concurrent
/// decrements of the same product never lose updates.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: DashMap<String, Slot>,
    next_position: AtomicU64,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.insert(product);
        }
        store
    }

    fn insert(&self, product: Product) {
        match self.products.entry(product.id.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().product = product,
            Entry::Vacant(vacant) => {
                let position = self.next_position.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Slot { position, product });
            }
        }
    }

    /// Current stock for `id`, if the product exists.
    pub fn stock_of(&self, id: &str) -> Option<u32> {
        self.products.get(id).map(|entry| entry.product.stock)
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    fn backend(&self) -> &'static str {
        "in-memory"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut entries: Vec<(u64, Product)> = self
            .products
            .iter()
            .map(|entry| (entry.position, entry.product.clone()))
            .collect();
        entries.sort_by_key(|(position, _)| *position);
        Ok(entries.into_iter().map(|(_, product)| product).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).map(|entry| entry.product.clone()))
    }

    async fn decrement_stock(
        &self,
        id: &str,
        quantity: u32,
    ) -> Result<StockDecrement, StoreError> {
        let Some(mut entry) = self.products.get_mut(id) else {
            return Ok(StockDecrement::UnknownProduct);
        };

        let stock = entry.product.stock;
        if quantity > stock {
            warn!(
                product_id = %id,
                stock,
                quantity,
                "Decrement exceeds available stock; clamping at zero"
            );
        }
        entry.product.stock = stock.saturating_sub(quantity);

        Ok(StockDecrement::Applied {
            remaining: entry.product.stock,
        })
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        self.insert(product);
        Ok(())
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.products.is_empty())
    }
}
