use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat string map attached to a payment session.
///
/// It is the only channel carrying cart contents from session creation to
/// settlement, so it must survive the processor's transport unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationMetadata(BTreeMap<String, String>);

impl ReservationMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for ReservationMetadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Kind of a verified processor notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// The buyer completed payment for a checkout session
    CheckoutCompleted,
    /// Any other notification kind, kept verbatim for logging
    Other(String),
}

impl PaymentEventType {
    pub const CHECKOUT_COMPLETED: &'static str = "checkout.session.completed";

    pub fn parse(raw: &str) -> Self {
        if raw == Self::CHECKOUT_COMPLETED {
            Self::CheckoutCompleted
        } else {
            Self::Other(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutCompleted => Self::CHECKOUT_COMPLETED,
            Self::Other(raw) => raw,
        }
    }
}

/// Decoded, signature-verified processor notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub id: String,
    pub event_type: PaymentEventType,
    pub session_id: Option<String>,
    pub metadata: ReservationMetadata,
}

/// One `(product, quantity)` pair recovered from reservation metadata.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReservedLine {
    pub product_id: String,
    pub quantity: u32,
}

impl ReservedLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}
