use axum::{extract::State, Json};

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::models::Product;

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Catalog in listing order", body = [Product]),
        (status = 500, description = "Product store unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ServiceError> {
    Ok(Json(state.store.list_products().await?))
}
