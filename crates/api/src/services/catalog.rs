//! Product catalog.
//!
//! Anyone may browse; only admins mutate (enforced by the policy table).

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use keik_core::{IdentityId, Price, ProductId};

use crate::db::{BakerRepository, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{NewProduct, Product, ProductUpdate};

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Product fields as sent by clients. Every field is optional on the wire;
/// creation requires all of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub baker_id: Option<IdentityId>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    bakers: BakerRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            bakers: BakerRepository::new(pool),
        }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.products.list().await?)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such product exists.
    pub async fn get(&self, id: ProductId) -> Result<Product, AppError> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    /// Create a product from a complete input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if any field is missing, the price is
    /// not positive, or the baker does not exist.
    pub async fn create(&self, input: ProductInput) -> Result<Product, AppError> {
        let (Some(name), Some(description), Some(price), Some(image_url), Some(baker_id)) = (
            non_blank(input.name),
            non_blank(input.description),
            input.price,
            non_blank(input.image_url),
            input.baker_id,
        ) else {
            return Err(AppError::Validation(
                "Please provide all required fields".to_string(),
            ));
        };

        let product = NewProduct {
            name,
            description,
            price: parse_price(price)?,
            image_url,
            baker_id,
        };
        self.ensure_baker_exists(baker_id).await?;

        let created = self.products.create(&product).await?;
        tracing::info!(product_id = %created.id, baker_id = %baker_id, "Product created");
        Ok(created)
    }

    /// Merge the provided fields into a product. Blank strings are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such product exists.
    /// Returns `AppError::Validation` for a non-positive price or unknown baker.
    pub async fn update(&self, id: ProductId, input: ProductInput) -> Result<Product, AppError> {
        let update = ProductUpdate {
            name: non_blank(input.name),
            description: non_blank(input.description),
            price: input.price.map(parse_price).transpose()?,
            image_url: non_blank(input.image_url),
            baker_id: input.baker_id,
        };
        if let Some(baker_id) = update.baker_id {
            self.ensure_baker_exists(baker_id).await?;
        }
        if update.is_empty() {
            return self.get(id).await;
        }

        self.products.update(id, &update).await.map_err(not_found)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such product exists.
    pub async fn delete(&self, id: ProductId) -> Result<(), AppError> {
        self.products.delete(id).await.map_err(not_found)?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn ensure_baker_exists(&self, baker_id: IdentityId) -> Result<(), AppError> {
        if self.bakers.subscription(baker_id).await?.is_none() {
            return Err(AppError::Validation("Home Baker not found".to_string()));
        }
        Ok(())
    }
}

fn parse_price(amount: Decimal) -> Result<Price, AppError> {
    Price::new(amount).map_err(|e| AppError::Validation(e.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
        other => AppError::Database(other),
    }
}
