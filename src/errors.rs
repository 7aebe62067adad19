use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// JSON error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Insufficient stock for Leather Handbag (remaining: 1)",
    "code": "insufficient_stock",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Human-readable reason, suitable for display in the cart UI
    pub error: String,
    /// Machine-readable error code
    pub code: String,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Why a cart was refused at validation time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartRejection {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity for product {product_id} must be at least 1")]
    InvalidQuantity { product_id: String },

    #[error("Unknown product {product_id}")]
    UnknownProduct { product_id: String },

    #[error("Insufficient stock for {product_name} (remaining: {available_stock})")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        requested: u32,
        available_stock: u32,
    },
}

impl CartRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::UnknownProduct { .. } => "unknown_product",
            Self::InsufficientStock { .. } => "insufficient_stock",
        }
    }
}

/// Failures of the product store collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Corrupt product record: {0}")]
    Corrupt(String),
}

/// Failures of the payment gateway's session-creation capability
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway credentials are not configured")]
    NotConfigured,

    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

/// Cart contents that cannot be carried in session metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Cart has {lines} distinct products; at most {max} can be checked out at once")]
    TooManyLines { lines: usize, max: usize },

    #[error("Product id {product_id:?} cannot be carried in payment metadata")]
    InvalidProductId { product_id: String },
}

/// Failures of the gateway's notification-verification capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("Webhook signing secret is not configured")]
    MissingSecret,

    #[error("Missing signature header")]
    MissingHeader,

    #[error("Malformed signature header")]
    MalformedHeader,

    #[error("Signature timestamp outside tolerance")]
    TimestampOutsideTolerance,

    #[error("No signature matches the payload")]
    SignatureMismatch,

    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),
}

/// Checkout Orchestrator failure taxonomy
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Rejected(#[from] CartRejection),

    #[error("Payment gateway is not configured")]
    GatewayMisconfigured,

    #[error("Payment gateway error: {0}")]
    Gateway(#[source] GatewayError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Product store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid callback base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured => CheckoutError::GatewayMisconfigured,
            other => CheckoutError::Gateway(other),
        }
    }
}

/// Settlement Reconciler failure taxonomy
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Webhook signing secret is not configured")]
    GatewayMisconfigured,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(#[source] VerificationError),
}

/// HTTP-facing error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    CartRejected(CartRejection),

    #[error("{0}")]
    InvalidCart(MetadataError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook Error: {0}")]
    InvalidSignature(String),

    #[error("Payment gateway misconfigured: {0}")]
    GatewayMisconfigured(String),

    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<CheckoutError> for ServiceError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(rejection) => ServiceError::CartRejected(rejection),
            CheckoutError::Metadata(err) => ServiceError::InvalidCart(err),
            CheckoutError::GatewayMisconfigured => {
                ServiceError::GatewayMisconfigured("missing payment API credentials".to_string())
            }
            CheckoutError::Gateway(err) => ServiceError::GatewayError(err.to_string()),
            CheckoutError::Store(err) => ServiceError::StoreError(err.to_string()),
            CheckoutError::InvalidBaseUrl(reason) => ServiceError::BadRequest(reason),
        }
    }
}

impl From<NotificationError> for ServiceError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::GatewayMisconfigured => {
                ServiceError::GatewayMisconfigured("missing webhook signing secret".to_string())
            }
            NotificationError::InvalidSignature(reason) => {
                ServiceError::InvalidSignature(reason.to_string())
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::StoreError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CartRejected(_)
            | Self::InvalidCart(_)
            | Self::BadRequest(_)
            | Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::GatewayMisconfigured(_)
            | Self::GatewayError(_)
            | Self::StoreError(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::CartRejected(rejection) => rejection.code(),
            Self::InvalidCart(_) => "invalid_cart",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::GatewayMisconfigured(_) => "gateway_misconfigured",
            Self::GatewayError(_) => "gateway_error",
            Self::StoreError(_) => "store_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Message suitable for HTTP responses.
    /// Internal causes are replaced by generic text.
    pub fn response_message(&self) -> String {
        match self {
            Self::GatewayMisconfigured(_) => "Payment provider is not configured".to_string(),
            Self::GatewayError(_) => "Error while creating the payment session".to_string(),
            Self::StoreError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.response_message(),
            code: self.code().to_string(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::CartRejected(CartRejection::EmptyCart).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.error, "Cart is empty");
        assert_eq!(payload.code, "empty_cart");
    }

    #[test]
    fn insufficient_stock_message_names_remaining_units() {
        let rejection = CartRejection::InsufficientStock {
            product_id: "p2".into(),
            product_name: "Camera".into(),
            requested: 2,
            available_stock: 1,
        };
        assert_eq!(
            ServiceError::CartRejected(rejection).response_message(),
            "Insufficient stock for Camera (remaining: 1)"
        );
    }

    #[test]
    fn status_code_mapping_follows_taxonomy() {
        assert_eq!(
            ServiceError::from(CheckoutError::Rejected(CartRejection::EmptyCart)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(CheckoutError::GatewayMisconfigured).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::from(CheckoutError::from(GatewayError::Transport("down".into())))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::from(NotificationError::InvalidSignature(
                VerificationError::SignatureMismatch
            ))
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(NotificationError::GatewayMisconfigured).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_configured_gateway_error_becomes_misconfiguration() {
        assert!(matches!(
            CheckoutError::from(GatewayError::NotConfigured),
            CheckoutError::GatewayMisconfigured
        ));
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::StoreError("connection refused on 10.0.0.3".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::GatewayError("sk_live_... rejected".into()).response_message(),
            "Error while creating the payment session"
        );
    }
}
