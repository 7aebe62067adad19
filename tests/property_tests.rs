//! Property-based tests for the reservation metadata codec and cart validation.

use proptest::prelude::*;
use std::collections::BTreeMap;
use storefront_checkout::{
    errors::{CartRejection, MetadataError},
    models::{CartLine, CartRequest, Product, ReservedLine, ValidatedCart, ValidatedLine},
    services::{
        cart_validator::{validate_cart, UnknownProductPolicy},
        reservation::{decode_metadata, encode_metadata, MAX_LINES, MAX_PRODUCT_ID_LEN},
    },
};

// Ids made of the characters real catalogs use, within metadata key limits
fn product_id_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,35}"
}

fn reservation_strategy(max_lines: usize) -> impl Strategy<Value = BTreeMap<String, u32>> {
    prop::collection::btree_map(product_id_strategy(), 1u32..10_000, 1..=max_lines)
}

fn validated_cart(lines: &BTreeMap<String, u32>) -> ValidatedCart {
    ValidatedCart::new(
        lines
            .iter()
            .map(|(id, quantity)| ValidatedLine {
                product: Product::new(id.clone(), format!("Product {id}"), 1000, "eur", *quantity),
                quantity: *quantity,
            })
            .collect(),
    )
}

fn sorted(mut lines: Vec<ReservedLine>) -> Vec<ReservedLine> {
    lines.sort();
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn metadata_round_trips_exactly(lines in reservation_strategy(MAX_LINES)) {
        let metadata = encode_metadata(&validated_cart(&lines)).unwrap();
        prop_assert_eq!(metadata.len(), lines.len() * 2);

        let expected: Vec<ReservedLine> = lines
            .iter()
            .map(|(id, quantity)| ReservedLine::new(id.clone(), *quantity))
            .collect();
        prop_assert_eq!(sorted(decode_metadata(&metadata)), expected);
    }

    #[test]
    fn metadata_keys_fit_processor_limits(lines in reservation_strategy(MAX_LINES)) {
        let metadata = encode_metadata(&validated_cart(&lines)).unwrap();
        prop_assert!(metadata.len() <= 50);
        for (key, value) in metadata.iter() {
            prop_assert!(key.chars().count() <= 40, "key too long: {}", key);
            prop_assert!(value.chars().count() <= 500);
        }
    }

    #[test]
    fn empty_cart_always_rejected(policy in prop_oneof![
        Just(UnknownProductPolicy::Skip),
        Just(UnknownProductPolicy::Reject)
    ]) {
        let result = validate_cart(&CartRequest::default(), policy, |_| None);
        prop_assert_eq!(result, Err(CartRejection::EmptyCart));
    }

    #[test]
    fn validation_never_exceeds_stock(
        stock in 0u32..20,
        quantity in 1u32..40,
    ) {
        let product = Product::new("p", "Item", 100, "eur", stock);
        let cart = CartRequest::new(vec![CartLine::new("p", quantity)]);
        let result = validate_cart(&cart, UnknownProductPolicy::Reject, |_| Some(product.clone()));

        if quantity <= stock {
            prop_assert_eq!(result.unwrap().reservations(), vec![("p".to_string(), quantity)]);
        } else {
            let rejected = matches!(
                result,
                Err(CartRejection::InsufficientStock { available_stock, requested, .. })
                    if available_stock == stock && requested == quantity
            );
            prop_assert!(rejected);
        }
    }
}

#[test]
fn single_line_round_trip() {
    let lines = BTreeMap::from([("p1".to_string(), 2)]);
    let metadata = encode_metadata(&validated_cart(&lines)).unwrap();
    assert_eq!(decode_metadata(&metadata), vec![ReservedLine::new("p1", 2)]);
}

#[test]
fn round_trip_at_line_limit() {
    let lines: BTreeMap<String, u32> = (0..MAX_LINES)
        .map(|i| (format!("{:0>width$}", i, width = MAX_PRODUCT_ID_LEN), i as u32 + 1))
        .collect();
    let metadata = encode_metadata(&validated_cart(&lines)).unwrap();
    assert_eq!(metadata.len(), 50);
    assert_eq!(decode_metadata(&metadata).len(), MAX_LINES);

    let mut over = lines.clone();
    over.insert("one-too-many".to_string(), 1);
    assert_eq!(
        encode_metadata(&validated_cart(&over)),
        Err(MetadataError::TooManyLines {
            lines: MAX_LINES + 1,
            max: MAX_LINES
        })
    );
}
