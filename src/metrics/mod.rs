//! Prometheus counters for the checkout flow, exposed at `/metrics`.

use axum::{http::header, http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
    static ref CHECKOUT_ATTEMPTS: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new(
                "storefront_checkout_attempts_total",
                "Checkout attempts by outcome"
            ),
            &["outcome"],
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric can be registered");
        counter
    };
    static ref WEBHOOK_EVENTS: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new(
                "storefront_webhook_events_total",
                "Payment notifications by outcome"
            ),
            &["outcome"],
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric can be registered");
        counter
    };
    static ref STOCK_DECREMENTS: IntCounter = {
        let counter = IntCounter::new(
            "storefront_stock_decrements_total",
            "Stock decrements applied by settlement"
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric can be registered");
        counter
    };
}

pub fn record_checkout(outcome: &str) {
    CHECKOUT_ATTEMPTS.with_label_values(&[outcome]).inc();
}

pub fn record_webhook(outcome: &str) {
    WEBHOOK_EVENTS.with_label_values(&[outcome]).inc();
}

pub fn record_stock_decrement() {
    STOCK_DECREMENTS.inc();
}

/// Prometheus text exposition of every registered counter.
pub fn render() -> Result<String, prometheus::Error> {
    lazy_static::initialize(&CHECKOUT_ATTEMPTS);
    lazy_static::initialize(&WEBHOOK_EVENTS);
    lazy_static::initialize(&STOCK_DECREMENTS);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_checkout_counters() {
        record_checkout("rejected");
        record_webhook("ignored");
        record_stock_decrement();

        let text = render().unwrap();
        assert!(text.contains("storefront_checkout_attempts_total{outcome=\"rejected\"}"));
        assert!(text.contains("storefront_webhook_events_total{outcome=\"ignored\"}"));
        assert!(text.contains("storefront_stock_decrements_total"));
    }
}
