//! Integration tests for `POST /payment-webhook`.

mod common;

use axum::http::StatusCode;
use common::{
    completed_event, event_payload, response_json, sample_products, sign, RecordingGateway,
    TestApp,
};
use serde_json::json;
use storefront_checkout::models::ReservationMetadata;

fn reservation(lines: &[(&str, u32)]) -> ReservationMetadata {
    let mut metadata = ReservationMetadata::new();
    for (id, quantity) in lines {
        metadata.insert(format!("prod_{id}"), *id);
        metadata.insert(format!("qty_{id}"), quantity.to_string());
    }
    metadata
}

#[tokio::test]
async fn completed_payment_decrements_each_reserved_line() {
    let app = TestApp::new(sample_products());

    let payload = completed_event("cs_1", &reservation(&[("p1", 2), ("p3", 5)]));
    let response = app.deliver(&payload).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({ "received": true }));
    assert_eq!(app.stock("p1"), 1);
    assert_eq!(app.stock("p2"), 1);
    assert_eq!(app.stock("p3"), 15);
}

#[tokio::test]
async fn checkout_metadata_round_trips_into_settlement() {
    let app = TestApp::new(sample_products());

    let response = app
        .checkout(json!([
            { "id": "p3", "quantity": 7 },
            { "id": "p2", "quantity": 1 }
        ]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let (session_id, request) = app.gateway.sessions().remove(0);

    let response = app.deliver(&completed_event(&session_id, &request.metadata)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stock("p3"), 13);
    assert_eq!(app.stock("p2"), 0);
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn other_event_types_are_acknowledged_without_mutation() {
    let app = TestApp::new(sample_products());

    let payload = event_payload(
        "checkout.session.expired",
        "cs_2",
        &reservation(&[("p1", 2)]),
    );
    let response = app.deliver(&payload).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn tampered_payload_is_rejected_without_mutation() {
    let app = TestApp::new(sample_products());

    let original = completed_event("cs_3", &reservation(&[("p1", 1)]));
    let signature = sign(&original);
    let tampered = completed_event("cs_3", &reservation(&[("p1", 3)]));

    let response = app.post_webhook(&tampered, Some(&signature)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "invalid_signature");
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn unsigned_notification_is_rejected() {
    let app = TestApp::new(sample_products());

    let payload = completed_event("cs_4", &reservation(&[("p1", 1)]));
    let response = app.post_webhook(&payload, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.post_webhook(&payload, Some("garbage")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn redelivered_event_decrements_again() {
    // No reservation ledger exists, so at-least-once delivery double-counts.
    let app = TestApp::new(sample_products());

    let payload = completed_event("cs_5", &reservation(&[("p3", 1)]));
    assert_eq!(app.deliver(&payload).await.status(), StatusCode::OK);
    assert_eq!(app.deliver(&payload).await.status(), StatusCode::OK);
    assert_eq!(app.stock("p3"), 18);
}

#[tokio::test]
async fn unknown_products_in_metadata_are_acknowledged() {
    let app = TestApp::new(sample_products());

    let payload = completed_event("cs_6", &reservation(&[("retired", 1), ("p1", 1)]));
    let response = app.deliver(&payload).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stock("p1"), 2);
}

#[tokio::test]
async fn signed_but_undecodable_event_is_acknowledged() {
    let app = TestApp::new(sample_products());

    let response = app.deliver(b"{\"unexpected\": true}").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn missing_signing_secret_is_a_server_error() {
    let app = TestApp::with_gateway(sample_products(), RecordingGateway::unconfigured());

    let payload = completed_event("cs_7", &reservation(&[("p1", 1)]));
    let response = app.deliver(&payload).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response_json(response).await["code"], "gateway_misconfigured");
    assert_eq!(app.stock("p1"), 3);
}

#[tokio::test]
async fn legacy_webhook_path_is_an_alias() {
    let app = TestApp::new(sample_products());

    let payload = completed_event("cs_8", &reservation(&[("p1", 1)]));
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("stripe-signature", sign(&payload))
        .body(axum::body::Body::from(payload))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stock("p1"), 2);
}
