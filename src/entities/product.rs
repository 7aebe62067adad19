use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::Product;

/// Product row backing [`crate::store::SqlProductStore`]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Listing order within the catalog
    pub position: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Unit price in minor currency units
    pub price: i64,

    /// Lower-case ISO 4217 currency code
    pub currency: String,

    pub image_url: Option<String>,

    /// Units available; kept non-negative by the clamped decrement
    pub stock: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let unit_price = u64::try_from(model.price).map_err(|_| {
            StoreError::Corrupt(format!("product {} has negative price", model.id))
        })?;
        let stock = u32::try_from(model.stock.max(0)).map_err(|_| {
            StoreError::Corrupt(format!("product {} stock out of range", model.id))
        })?;

        Ok(Product {
            id: model.id,
            name: model.name,
            description: model.description,
            unit_price,
            currency: model.currency,
            image_url: model.image_url,
            stock,
        })
    }
}

impl ActiveModel {
    /// Active model for inserting or overwriting `product` at `position`.
    pub fn from_product(product: &Product, position: i32) -> Result<Self, StoreError> {
        let price = i64::try_from(product.unit_price).map_err(|_| {
            StoreError::Corrupt(format!("product {} price out of range", product.id))
        })?;

        Ok(Self {
            id: Set(product.id.clone()),
            position: Set(position),
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(price),
            currency: Set(product.currency.clone()),
            image_url: Set(product.image_url.clone()),
            stock: Set(i64::from(product.stock)),
            created_at: Set(Utc::now()),
            updated_at: Set(Some(Utc::now())),
        })
    }
}
