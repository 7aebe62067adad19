use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Checkout API",
        version = "0.1.0",
        description = "Cart validation, hosted payment sessions and webhook-driven stock settlement."
    ),
    paths(
        crate::handlers::checkout::create_checkout,
        crate::handlers::payment_webhooks::payment_webhook,
        crate::handlers::products::list_products,
    ),
    components(schemas(
        crate::models::CartRequest,
        crate::models::CartLine,
        crate::models::Product,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::payment_webhooks::WebhookAck,
        crate::errors::ErrorResponse
    )),
    tags(
        (name = "Checkout", description = "Cart validation and payment session creation"),
        (name = "Payments", description = "Payment processor notifications"),
        (name = "Catalog", description = "Product listing")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_checkout_routes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("/checkout"));
        assert!(json.contains("/payment-webhook"));
        assert!(json.contains("ErrorResponse"));
    }
}
