//! Settlement Reconciler
//!
//! Applies the stock decrements carried by a verified payment-completed
//! notification. This is the only path that writes `stock` outside of
//! catalog seeding.
//!
//! There is no reservation ledger: a redelivered completion event is applied
//! again.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::reservation::decode_metadata;
use crate::errors::{NotificationError, VerificationError};
use crate::gateway::PaymentGateway;
use crate::metrics;
use crate::models::{PaymentEvent, PaymentEventType, ReservedLine};
use crate::store::{ProductStore, StockDecrement};

/// Per-line outcome of a settlement pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Decremented { remaining: u32 },
    UnknownProduct,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledLine {
    pub line: ReservedLine,
    pub outcome: LineOutcome,
}

/// What was done with an acknowledged notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// A payment-completed event whose reservation lines were processed
    Settled {
        event_id: String,
        session_id: Option<String>,
        lines: Vec<SettledLine>,
    },
    /// An authentic event this system does not act on
    Ignored { event_type: String },
}

impl Ack {
    pub fn settled_lines(&self) -> &[SettledLine] {
        match self {
            Ack::Settled { lines, .. } => lines,
            Ack::Ignored { .. } => &[],
        }
    }
}

#[derive(Clone)]
pub struct SettlementService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn ProductStore>,
}

impl SettlementService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn ProductStore>) -> Self {
        Self { gateway, store }
    }

    /// Verifies, decodes and settles one notification.
    ///
    /// Only signature problems and a missing signing secret are errors; every
    /// other outcome is acknowledged so the processor stops redelivering.
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    pub async fn handle_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<Ack, NotificationError> {
        let event = match self.gateway.verify_notification(payload, signature) {
            Ok(event) => event,
            Err(VerificationError::MissingSecret) => {
                error!("Webhook signing secret is not configured");
                metrics::record_webhook("misconfigured");
                return Err(NotificationError::GatewayMisconfigured);
            }
            Err(VerificationError::MalformedEvent(reason)) => {
                warn!(%reason, "Signed notification could not be decoded; ignoring");
                metrics::record_webhook("ignored");
                return Ok(Ack::Ignored {
                    event_type: "undecodable".to_string(),
                });
            }
            Err(err) => {
                warn!(error = %err, "Webhook signature verification failed");
                metrics::record_webhook("invalid_signature");
                return Err(NotificationError::InvalidSignature(err));
            }
        };

        if event.event_type != PaymentEventType::CheckoutCompleted {
            info!(event_id = %event.id, event_type = event.event_type.as_str(), "Ignoring event");
            metrics::record_webhook("ignored");
            return Ok(Ack::Ignored {
                event_type: event.event_type.as_str().to_string(),
            });
        }

        let ack = self.settle(event).await;
        metrics::record_webhook("settled");
        Ok(ack)
    }

    async fn settle(&self, event: PaymentEvent) -> Ack {
        let reserved = decode_metadata(&event.metadata);
        if reserved.is_empty() {
            warn!(event_id = %event.id, "Completed session carries no reservation metadata");
        }

        let mut lines = Vec::with_capacity(reserved.len());
        for line in reserved {
            let outcome = match self
                .store
                .decrement_stock(&line.product_id, line.quantity)
                .await
            {
                Ok(StockDecrement::Applied { remaining }) => {
                    info!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        remaining,
                        "Stock decremented"
                    );
                    metrics::record_stock_decrement();
                    LineOutcome::Decremented { remaining }
                }
                Ok(StockDecrement::UnknownProduct) => {
                    warn!(product_id = %line.product_id, "Settled product no longer exists");
                    LineOutcome::UnknownProduct
                }
                Err(err) => {
                    error!(product_id = %line.product_id, error = %err, "Stock decrement failed");
                    LineOutcome::Failed(err.to_string())
                }
            };
            lines.push(SettledLine { line, outcome });
        }

        info!(
            event_id = %event.id,
            session_id = event.session_id.as_deref().unwrap_or("-"),
            lines = lines.len(),
            "Checkout settled"
        );
        Ack::Settled {
            event_id: event.id,
            session_id: event.session_id,
            lines,
        }
    }
}
