//! Cart Validator
//!
//! Decides whether a requested cart can be sold against current stock. This
//! is a point-in-time read: nothing is held or decremented here, so two carts
//! may both pass for the last unit before either settles.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::{CartRejection, CheckoutError};
use crate::models::{CartRequest, Product, ValidatedCart, ValidatedLine};
use crate::store::ProductStore;

/// What to do with cart lines naming a product the store does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownProductPolicy {
    /// Drop the line and keep validating the rest of the cart
    #[default]
    Skip,
    /// Reject the whole cart with `UnknownProduct`
    Reject,
}

/// Validates `cart` using `lookup` for product snapshots.
///
/// Repeated ids are merged before any check. Lines are checked in cart order
/// and the first violation wins.
pub fn validate_cart<F>(
    cart: &CartRequest,
    policy: UnknownProductPolicy,
    mut lookup: F,
) -> Result<ValidatedCart, CartRejection>
where
    F: FnMut(&str) -> Option<Product>,
{
    if cart.is_empty() {
        return Err(CartRejection::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.items.len());
    for line in cart.merged_lines() {
        if line.quantity == 0 {
            return Err(CartRejection::InvalidQuantity {
                product_id: line.product_id,
            });
        }

        let Some(product) = lookup(&line.product_id) else {
            match policy {
                UnknownProductPolicy::Skip => {
                    debug!(product_id = %line.product_id, "Skipping unknown product");
                    continue;
                }
                UnknownProductPolicy::Reject => {
                    return Err(CartRejection::UnknownProduct {
                        product_id: line.product_id,
                    })
                }
            }
        };

        if line.quantity > product.stock {
            return Err(CartRejection::InsufficientStock {
                product_id: product.id,
                product_name: product.name,
                requested: line.quantity,
                available_stock: product.stock,
            });
        }

        lines.push(ValidatedLine {
            product,
            quantity: line.quantity,
        });
    }

    if lines.is_empty() {
        return Err(CartRejection::EmptyCart);
    }

    Ok(ValidatedCart::new(lines))
}

/// Store-backed validator used by the checkout flow.
#[derive(Clone)]
pub struct CartValidator {
    store: Arc<dyn ProductStore>,
    policy: UnknownProductPolicy,
}

impl CartValidator {
    pub fn new(store: Arc<dyn ProductStore>, policy: UnknownProductPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> UnknownProductPolicy {
        self.policy
    }

    /// Reads a snapshot of every distinct product in the cart, then validates.
    #[instrument(skip(self, cart), fields(lines = cart.items.len()))]
    pub async fn validate(&self, cart: &CartRequest) -> Result<ValidatedCart, CheckoutError> {
        let mut snapshot = Vec::new();
        for line in cart.merged_lines() {
            if let Some(product) = self.store.find_by_id(&line.product_id).await? {
                snapshot.push(product);
            }
        }

        let validated = validate_cart(cart, self.policy, |id| {
            snapshot.iter().find(|product| product.id == id).cloned()
        })?;
        Ok(validated)
    }
}
