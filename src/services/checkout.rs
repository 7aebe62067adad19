//! Checkout Orchestrator
//!
//! Turns a validated cart into a hosted payment session. Stock is not touched
//! and nothing is persisted: the reservation travels only inside the session
//! metadata until the processor reports completion.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

use super::cart_validator::CartValidator;
use super::reservation::encode_metadata;
use crate::errors::CheckoutError;
use crate::gateway::{LineItem, PaymentGateway, SessionRequest};
use crate::metrics;
use crate::models::{CartRequest, ValidatedCart};

/// Where the processor sends the buyer after paying or abandoning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CallbackUrls {
    /// Resolves both callback paths against `base` (scheme and host, optionally a path prefix).
    pub fn from_base(
        base: &str,
        success_path: &str,
        cancel_path: &str,
    ) -> Result<Self, CheckoutError> {
        let mut base = base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| CheckoutError::InvalidBaseUrl(format!("{base}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CheckoutError::InvalidBaseUrl(format!(
                "unsupported scheme {}",
                base.scheme()
            )));
        }

        let join = |path: &str| {
            base.join(path.trim_start_matches('/'))
                .map(String::from)
                .map_err(|e| CheckoutError::InvalidBaseUrl(format!("{path}: {e}")))
        };
        Ok(Self {
            success_url: join(success_path)?,
            cancel_url: join(cancel_path)?,
        })
    }
}

/// Redirect target handed back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// Builds and submits the session for an already validated cart.
pub async fn start_checkout(
    cart: &ValidatedCart,
    gateway: &dyn PaymentGateway,
    urls: &CallbackUrls,
) -> Result<CheckoutRedirect, CheckoutError> {
    if !gateway.is_configured() {
        return Err(CheckoutError::GatewayMisconfigured);
    }

    let request = SessionRequest {
        line_items: cart.lines().iter().map(LineItem::from).collect(),
        metadata: encode_metadata(cart)?,
        success_url: urls.success_url.clone(),
        cancel_url: urls.cancel_url.clone(),
    };

    let session = gateway.create_session(request).await?;
    Ok(CheckoutRedirect {
        session_id: session.id,
        url: session.url,
    })
}

#[derive(Clone)]
pub struct CheckoutService {
    validator: CartValidator,
    gateway: Arc<dyn PaymentGateway>,
    success_path: String,
    cancel_path: String,
}

impl CheckoutService {
    pub fn new(
        validator: CartValidator,
        gateway: Arc<dyn PaymentGateway>,
        success_path: impl Into<String>,
        cancel_path: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            gateway,
            success_path: success_path.into(),
            cancel_path: cancel_path.into(),
        }
    }

    /// Validates `cart` and opens a payment session for it.
    ///
    /// Missing gateway credentials are reported before the cart is even read.
    #[instrument(skip(self, cart), fields(lines = cart.items.len()))]
    pub async fn checkout(
        &self,
        cart: &CartRequest,
        base_url: &str,
    ) -> Result<CheckoutRedirect, CheckoutError> {
        let result = self.run(cart, base_url).await;
        match &result {
            Ok(redirect) => {
                info!(session_id = %redirect.session_id, "Checkout session opened");
                metrics::record_checkout("session_created");
            }
            Err(CheckoutError::Rejected(rejection)) => {
                info!(code = rejection.code(), reason = %rejection, "Cart rejected");
                metrics::record_checkout("rejected");
            }
            Err(err) => {
                warn!(error = %err, "Checkout failed");
                metrics::record_checkout("failed");
            }
        }
        result
    }

    async fn run(
        &self,
        cart: &CartRequest,
        base_url: &str,
    ) -> Result<CheckoutRedirect, CheckoutError> {
        if !self.gateway.is_configured() {
            return Err(CheckoutError::GatewayMisconfigured);
        }
        let urls = CallbackUrls::from_base(base_url, &self.success_path, &self.cancel_path)?;
        let validated = self.validator.validate(cart).await?;
        start_checkout(&validated, self.gateway.as_ref(), &urls).await
    }
}
