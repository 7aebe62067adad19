use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::models::CartRequest;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the buyer to
    pub url: String,
}

// POST /checkout (alias /api/checkout)
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CartRequest,
    responses(
        (status = 200, description = "Payment session created", body = CheckoutResponse),
        (status = 400, description = "Cart rejected", body = crate::errors::ErrorResponse),
        (status = 500, description = "Payment provider unavailable or misconfigured", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ServiceError> {
    let Json(cart) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    let base_url = callback_base(&state.config, &headers);

    let redirect = state.checkout.checkout(&cart, &base_url).await?;
    Ok(Json(CheckoutResponse { url: redirect.url }))
}

fn first_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Base for the success and cancel URLs.
///
/// A configured `public_base_url` wins; otherwise proxy headers are trusted.
fn callback_base(config: &AppConfig, headers: &HeaderMap) -> String {
    if let Some(base) = config.public_base_url.as_deref() {
        if !base.trim().is_empty() {
            return base.trim().to_string();
        }
    }

    let proto = first_header(headers, "x-forwarded-proto").unwrap_or("http");
    match first_header(headers, "x-forwarded-host").or_else(|| first_header(headers, "host")) {
        Some(host) => format!("{proto}://{host}"),
        None => {
            debug!("Request carries no host; falling back to localhost");
            format!("{proto}://localhost:{}", config.port)
        }
    }
}
