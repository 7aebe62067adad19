use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::product::Product;

/// One requested line of a cart as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    /// Product identifier
    #[serde(rename = "id")]
    #[schema(example = "prod-1")]
    pub product_id: String,

    /// Requested units (must be positive)
    #[schema(example = 2)]
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Body of `POST /checkout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl CartRequest {
    pub fn new(items: Vec<CartLine>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collapses repeated product ids into a single line.
    ///
    /// Quantities of repeated ids are summed; each id keeps the position of
    /// its first occurrence.
    pub fn merged_lines(&self) -> Vec<CartLine> {
        let mut merged: Vec<CartLine> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match merged
                .iter_mut()
                .find(|line| line.product_id == item.product_id)
            {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => merged.push(item.clone()),
            }
        }
        merged
    }
}

/// A cart line that passed stock validation, carrying the product snapshot
/// read at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    pub product: Product,
    pub quantity: u32,
}

impl ValidatedLine {
    pub fn line_total(&self) -> u64 {
        self.product.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// Point-in-time result of cart validation. Holds no reservation on stock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedCart {
    lines: Vec<ValidatedLine>,
}

impl ValidatedCart {
    pub fn new(lines: Vec<ValidatedLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[ValidatedLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `(product_id, quantity)` pairs in cart order.
    pub fn reservations(&self) -> Vec<(String, u32)> {
        self.lines
            .iter()
            .map(|line| (line.product.id.clone(), line.quantity))
            .collect()
    }

    pub fn total_amount(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.line_total()))
    }
}
