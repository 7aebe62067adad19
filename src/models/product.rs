use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A catalog product as seen by the checkout core.
///
/// `unit_price` is expressed in minor currency units (cents) and `stock` can
/// never be negative; decrements below zero are clamped by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique product identifier
    #[schema(example = "prod-1")]
    pub id: String,

    #[schema(example = "Vintage Denim Jacket")]
    pub name: String,

    pub description: String,

    /// Unit price in minor currency units
    #[serde(rename = "price")]
    #[schema(example = 4500)]
    pub unit_price: u64,

    /// Lower-case ISO 4217 currency code
    #[schema(example = "eur")]
    pub currency: String,

    /// Product image URL
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Units currently available
    pub stock: u32,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: u64,
        currency: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            unit_price,
            currency: currency.into(),
            image_url: None,
            stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}
