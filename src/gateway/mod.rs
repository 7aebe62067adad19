//! Payment Gateway capability.
//!
//! The checkout core depends on two narrow operations of the payment
//! processor: creating a hosted payment session, and verifying plus decoding
//! a signed asynchronous notification.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::{GatewayError, VerificationError};
use crate::models::{PaymentEvent, ReservationMetadata, ValidatedLine};

pub mod signature;
pub mod stripe;

pub use stripe::{StripeGateway, StripeSettings};

/// One priced line of a payment session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    /// Unit price in minor currency units
    pub unit_amount: u64,
    pub currency: String,
    pub quantity: u32,
}

impl From<&ValidatedLine> for LineItem {
    fn from(line: &ValidatedLine) -> Self {
        Self {
            name: line.product.name.clone(),
            description: line.product.description.clone(),
            unit_amount: line.product.unit_price,
            currency: line.product.currency.clone(),
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub line_items: Vec<LineItem>,
    pub metadata: ReservationMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session handle returned by the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub id: String,
    /// Hosted payment page the buyer is redirected to
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether API credentials for session creation are present
    fn is_configured(&self) -> bool;

    async fn create_session(&self, request: SessionRequest)
        -> Result<CreatedSession, GatewayError>;

    /// Authenticates `payload` against `signature` and decodes it.
    ///
    /// `payload` must be the raw request body, byte for byte.
    fn verify_notification<'a>(
        &self,
        payload: &[u8],
        signature: Option<&'a str>,
    ) -> Result<PaymentEvent, VerificationError>;
}
