use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::gateway::signature::SIGNATURE_HEADER;
use crate::handlers::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

// POST /payment-webhook (alias /webhook)
//
// The body is taken as raw bytes: the signature covers the exact payload.
#[utoipa::path(
    post,
    path = "/payment-webhook",
    request_body = String,
    responses(
        (status = 200, description = "Notification acknowledged", body = WebhookAck),
        (status = 400, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 500, description = "Signing secret not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state
        .settlement
        .handle_notification(&body, signature)
        .await?;
    Ok(Json(WebhookAck { received: true }))
}
