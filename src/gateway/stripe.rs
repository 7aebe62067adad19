use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::{signature, CreatedSession, PaymentGateway, SessionRequest};
use crate::config::AppConfig;
use crate::errors::{GatewayError, VerificationError};
use crate::models::PaymentEvent;

/// Stripe credentials and endpoint settings
#[derive(Clone, Debug)]
pub struct StripeSettings {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub webhook_tolerance_secs: u64,
    pub timeout: Duration,
}

impl StripeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            secret_key: config.stripe_secret_key().map(str::to_string),
            webhook_secret: config.stripe_webhook_secret().map(str::to_string),
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
            webhook_tolerance_secs: config.stripe_webhook_tolerance_secs,
            timeout: Duration::from_millis(config.stripe_timeout_ms),
        }
    }
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe Checkout adapter
#[derive(Clone)]
pub struct StripeGateway {
    settings: StripeSettings,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(settings: StripeSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &StripeSettings {
        &self.settings
    }
}

/// Form body of `POST /v1/checkout/sessions`
fn session_form(request: &SessionRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((
            format!("{prefix}[price_data][currency]"),
            item.currency.clone(),
        ));
        params.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        params.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if !item.description.is_empty() {
            params.push((
                format!("{prefix}[price_data][product_data][description]"),
                item.description.clone(),
            ));
        }
        params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (key, value) in request.metadata.iter() {
        params.push((format!("metadata[{key}]"), value.to_string()));
    }
    params
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn is_configured(&self) -> bool {
        self.settings.secret_key.is_some()
    }

    #[instrument(skip(self, request), fields(lines = request.line_items.len()))]
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        let secret_key = self
            .settings
            .secret_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.settings.api_base))
            .basic_auth(secret_key, Some(""))
            .form(&session_form(&request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "Stripe rejected session creation");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let url = session.url.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("session {} has no redirect url", session.id))
        })?;

        info!(session_id = %session.id, "Stripe checkout session created");
        Ok(CreatedSession {
            id: session.id,
            url,
        })
    }

    fn verify_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<PaymentEvent, VerificationError> {
        let secret = self
            .settings
            .webhook_secret
            .as_deref()
            .ok_or(VerificationError::MissingSecret)?;
        signature::verify_event(
            payload,
            signature,
            secret,
            self.settings.webhook_tolerance_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::LineItem;
    use crate::models::ReservationMetadata;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(api_base: &str) -> StripeSettings {
        StripeSettings {
            secret_key: Some("sk_test_123".into()),
            webhook_secret: Some("whsec_test".into()),
            api_base: api_base.to_string(),
            webhook_tolerance_secs: 300,
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> SessionRequest {
        let mut metadata = ReservationMetadata::new();
        metadata.insert("prod_p1", "p1");
        metadata.insert("qty_p1", "2");
        SessionRequest {
            line_items: vec![LineItem {
                name: "Jacket".into(),
                description: "Denim".into(),
                unit_amount: 4500,
                currency: "eur".into(),
                quantity: 2,
            }],
            metadata,
            success_url: "https://shop.example/success.html".into(),
            cancel_url: "https://shop.example/cancel.html".into(),
        }
    }

    #[test]
    fn form_encodes_line_items_and_metadata() {
        let form = session_form(&request());
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("4500"));
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            Some("Jacket")
        );
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("metadata[qty_p1]"), Some("2"));
    }

    #[tokio::test]
    async fn creates_session_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Basic c2tfdGVzdF8xMjM6"))
            .and(body_string_contains("metadata%5Bprod_p1%5D=p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.com/c/pay/cs_test_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(settings(&server.uri())).unwrap();
        let session = gateway.create_session(request()).await.unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_1");
    }

    #[tokio::test]
    async fn maps_stripe_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API Key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(settings(&server.uri())).unwrap();
        assert_matches!(
            gateway.create_session(request()).await,
            Err(GatewayError::Rejected { status: 401, ref message }) if message == "Invalid API Key provided"
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let gateway = StripeGateway::new(settings("http://127.0.0.1:1")).unwrap();
        assert_matches!(
            gateway.create_session(request()).await,
            Err(GatewayError::Transport(_))
        );
    }

    #[tokio::test]
    async fn missing_secret_key_is_not_configured() {
        let mut settings = settings("http://127.0.0.1:1");
        settings.secret_key = None;
        let gateway = StripeGateway::new(settings).unwrap();
        assert!(!gateway.is_configured());
        assert_matches!(
            gateway.create_session(request()).await,
            Err(GatewayError::NotConfigured)
        );
    }

    #[test]
    fn verification_requires_webhook_secret() {
        let mut settings = settings("http://127.0.0.1:1");
        settings.webhook_secret = None;
        let gateway = StripeGateway::new(settings).unwrap();
        assert_eq!(
            gateway.verify_notification(b"{}", Some("t=1,v1=00")),
            Err(VerificationError::MissingSecret)
        );
    }
}
