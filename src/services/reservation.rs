//! Reservation metadata codec.
//!
//! Each validated line becomes two entries: `prod_<id> = <id>` and
//! `qty_<id> = <decimal quantity>`. The quantity key is derived from the
//! product id alone, so decoding needs no ordering information.

use tracing::warn;

use crate::errors::MetadataError;
use crate::models::{ReservationMetadata, ReservedLine, ValidatedCart};

pub const PRODUCT_KEY_PREFIX: &str = "prod_";
pub const QUANTITY_KEY_PREFIX: &str = "qty_";

/// Processor limit of 50 metadata keys, two per line.
pub const MAX_LINES: usize = 25;

/// Processor limit of 40 characters per key, minus the longest prefix.
pub const MAX_PRODUCT_ID_LEN: usize = 35;

pub fn product_key(product_id: &str) -> String {
    format!("{PRODUCT_KEY_PREFIX}{product_id}")
}

pub fn quantity_key(product_id: &str) -> String {
    format!("{QUANTITY_KEY_PREFIX}{product_id}")
}

fn check_product_id(product_id: &str) -> Result<(), MetadataError> {
    let valid = !product_id.is_empty()
        && product_id.chars().count() <= MAX_PRODUCT_ID_LEN
        && !product_id.contains(['[', ']']);
    if valid {
        Ok(())
    } else {
        Err(MetadataError::InvalidProductId {
            product_id: product_id.to_string(),
        })
    }
}

/// Encodes every line of `cart` into session metadata.
pub fn encode_metadata(cart: &ValidatedCart) -> Result<ReservationMetadata, MetadataError> {
    if cart.len() > MAX_LINES {
        return Err(MetadataError::TooManyLines {
            lines: cart.len(),
            max: MAX_LINES,
        });
    }

    let mut metadata = ReservationMetadata::new();
    for (product_id, quantity) in cart.reservations() {
        check_product_id(&product_id)?;
        metadata.insert(quantity_key(&product_id), quantity.to_string());
        metadata.insert(product_key(&product_id), product_id);
    }
    Ok(metadata)
}

/// Recovers `(product, quantity)` pairs from session metadata.
///
/// Foreign keys are ignored. Entries without a parseable positive quantity
/// are logged and skipped so one bad line cannot block the rest.
pub fn decode_metadata(metadata: &ReservationMetadata) -> Vec<ReservedLine> {
    let mut lines = Vec::new();
    for (key, product_id) in metadata.iter() {
        if !key.starts_with(PRODUCT_KEY_PREFIX) {
            continue;
        }

        let Some(raw_quantity) = metadata.get(&quantity_key(product_id)) else {
            warn!(key, product_id, "Reservation entry has no quantity");
            continue;
        };

        match raw_quantity.trim().parse::<u32>() {
            Ok(quantity) if quantity > 0 => lines.push(ReservedLine::new(product_id, quantity)),
            _ => warn!(
                product_id,
                quantity = raw_quantity,
                "Reservation entry has an invalid quantity"
            ),
        }
    }
    lines
}
