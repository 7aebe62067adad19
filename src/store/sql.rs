use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict, SimpleExpr},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{ProductStore, StockDecrement};
use crate::entities::product::{self, Column, Entity as ProductEntity};
use crate::errors::StoreError;
use crate::models::Product;

/// Relational product store (SQLite or Postgres through sea-orm).
///
/// Stock decrements are a single conditional `UPDATE`, so atomicity is
/// provided by the database rather than by the caller.
#[derive(Clone)]
pub struct SqlProductStore {
    db: Arc<DatabaseConnection>,
}

impl SqlProductStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for SqlProductStore {
    fn backend(&self) -> &'static str {
        "sql"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        ProductEntity::find()
            .order_by_asc(Column::Position)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        ProductEntity::find_by_id(id.to_string())
            .one(&*self.db)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn decrement_stock(
        &self,
        id: &str,
        quantity: u32,
    ) -> Result<StockDecrement, StoreError> {
        let quantity = i64::from(quantity);
        // stock = CASE WHEN stock >= q THEN stock - q ELSE 0 END
        let clamped = Expr::case(
            Expr::col(Column::Stock).gte(quantity),
            Expr::col(Column::Stock).sub(quantity),
        )
        .finally(0i64);

        let result = ProductEntity::update_many()
            .col_expr(Column::Stock, Into::<SimpleExpr>::into(clamped))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(StockDecrement::UnknownProduct);
        }

        // Read-back is informational; the update above is the atomic step.
        let remaining = self
            .find_by_id(id)
            .await?
            .map(|product| product.stock)
            .unwrap_or(0);
        debug!(product_id = %id, remaining, "Stock decremented");

        Ok(StockDecrement::Applied { remaining })
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        let position = i32::try_from(ProductEntity::find().count(&*self.db).await?)
            .map_err(|_| StoreError::Corrupt("catalog too large".to_string()))?;
        let model = product::ActiveModel::from_product(&product, position)?;

        ProductEntity::insert(model)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::Name,
                        Column::Description,
                        Column::Price,
                        Column::Currency,
                        Column::ImageUrl,
                        Column::Stock,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(ProductEntity::find().count(&*self.db).await? == 0)
    }
}
