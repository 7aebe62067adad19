//! Storefront checkout library
//!
//! Cart validation against live stock, hosted payment sessions, and
//! webhook-driven stock settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::config::AppConfig;
use crate::gateway::PaymentGateway;
use crate::services::{CartValidator, CheckoutService, SettlementService};
use crate::store::ProductStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ProductStore>,
    pub checkout: Arc<CheckoutService>,
    pub settlement: Arc<SettlementService>,
}

impl AppState {
    /// Wires the checkout core from an explicit configuration object.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ProductStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let validator = CartValidator::new(store.clone(), config.unknown_product_policy);
        let checkout = CheckoutService::new(
            validator,
            gateway.clone(),
            config.success_path.clone(),
            config.cancel_path.clone(),
        );
        let settlement = SettlementService::new(gateway, store.clone());

        Self {
            config: Arc::new(config),
            store,
            checkout: Arc::new(checkout),
            settlement: Arc::new(settlement),
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else if config.should_allow_permissive_cors() {
        ::tracing::info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full HTTP surface: checkout, payment webhook, catalog and operational routes.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/checkout", post(handlers::checkout::create_checkout))
        .route("/api/checkout", post(handlers::checkout::create_checkout))
        .route(
            "/payment-webhook",
            post(handlers::payment_webhooks::payment_webhook),
        )
        .route("/webhook", post(handlers::payment_webhooks::payment_webhook))
        .route("/api/products", get(handlers::products::list_products))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
