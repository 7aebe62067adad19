#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use storefront_checkout::{
    app_router,
    config::AppConfig,
    errors::{GatewayError, VerificationError},
    gateway::{signature, CreatedSession, PaymentGateway, SessionRequest},
    models::{PaymentEvent, Product, ReservationMetadata},
    store::InMemoryProductStore,
    AppState,
};
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";
pub const BASE_URL: &str = "https://shop.test";

/// Payment gateway double that records every session request and verifies
/// notifications with the real signature scheme.
pub struct RecordingGateway {
    configured: bool,
    webhook_secret: Option<String>,
    fail_sessions: AtomicBool,
    created: AtomicUsize,
    sessions: Mutex<Vec<(String, SessionRequest)>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            configured: true,
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            fail_sessions: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            webhook_secret: None,
            ..Self::new()
        }
    }

    pub fn fail_sessions(&self) {
        self.fail_sessions.store(true, Ordering::SeqCst);
    }

    /// `(session id, request)` pairs in creation order
    pub fn sessions(&self) -> Vec<(String, SessionRequest)> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection reset by peer".into()));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_test_{n}");
        self.sessions.lock().unwrap().push((id.clone(), request));
        Ok(CreatedSession {
            url: format!("https://pay.test/{id}"),
            id,
        })
    }

    fn verify_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<PaymentEvent, VerificationError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(VerificationError::MissingSecret)?;
        signature::verify_event(payload, signature, secret, 300)
    }
}

/// Helper harness wiring the full router to an in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryProductStore>,
    pub gateway: Arc<RecordingGateway>,
}

impl TestApp {
    pub fn new(products: Vec<Product>) -> Self {
        Self::with_gateway(products, RecordingGateway::new())
    }

    pub fn with_gateway(products: Vec<Product>, gateway: RecordingGateway) -> Self {
        let mut config = AppConfig::default();
        config.public_base_url = Some(BASE_URL.to_string());
        Self::with_config(config, products, gateway)
    }

    pub fn with_config(config: AppConfig, products: Vec<Product>, gateway: RecordingGateway) -> Self {
        let store = Arc::new(InMemoryProductStore::with_products(products));
        let gateway = Arc::new(gateway);
        let state = AppState::new(config, store.clone(), gateway.clone());
        Self {
            router: app_router(state),
            store,
            gateway,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.request(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&body).expect("failed to serialize json request body"),
            ))
            .expect("failed to build request");
        self.request(request).await
    }

    pub async fn checkout(&self, items: Value) -> Response {
        self.post_json("/checkout", json!({ "items": items })).await
    }

    pub async fn post_webhook(&self, payload: &[u8], signature: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/payment-webhook")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        let request = builder
            .body(Body::from(payload.to_vec()))
            .expect("failed to build request");
        self.request(request).await
    }

    /// Delivers `payload` signed with the configured webhook secret.
    pub async fn deliver(&self, payload: &[u8]) -> Response {
        let signature = sign(payload);
        self.post_webhook(payload, Some(&signature)).await
    }

    pub fn stock(&self, id: &str) -> u32 {
        self.store.stock_of(id).expect("product exists")
    }
}

pub fn sign(payload: &[u8]) -> String {
    signature::signature_header(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), payload)
        .expect("signature header")
}

pub fn event_payload(event_type: &str, session_id: &str, metadata: &ReservationMetadata) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{session_id}"),
        "object": "event",
        "type": event_type,
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "metadata": metadata,
            }
        }
    }))
    .expect("event json")
}

pub fn completed_event(session_id: &str, metadata: &ReservationMetadata) -> Vec<u8> {
    event_payload("checkout.session.completed", session_id, metadata)
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("p1", "Denim Jacket", 4500, "eur", 3).with_description("Vintage cut"),
        Product::new("p2", "Camera", 25000, "eur", 1),
        Product::new("p3", "Notebook", 1800, "eur", 20),
    ]
}
