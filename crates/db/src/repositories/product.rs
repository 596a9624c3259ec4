//! Product reference data.

use std::sync::Arc;

use tracing::info;

use cemtrade_core::catalog::Product;
use cemtrade_shared::types::ProductId;

use crate::error::RepositoryError;
use crate::records::{encode, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: Arc<dyn EntityStore>,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Creates a product.
    pub async fn create_product(
        &self,
        name: impl Into<String>,
        category: Option<String>,
    ) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::new(),
            name: name.into(),
            category,
        };
        self.put(&product).await?;
        info!(product_id = %product.id, name = %product.name, "Created product");
        Ok(product)
    }

    /// Renames or recategorizes a product.
    pub async fn update_product(
        &self,
        id: ProductId,
        name: impl Into<String>,
        category: Option<String>,
    ) -> Result<Product, RepositoryError> {
        let _: Product = require(self.store.as_ref(), Collection::Products, id.into_inner()).await?;
        let product = Product {
            id,
            name: name.into(),
            category,
        };
        self.put(&product).await?;
        Ok(product)
    }

    /// Deletes a product.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Products, id.into_inner());
        self.store.commit(batch).await?;
        Ok(())
    }

    /// Lists products by name.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = fetch_all(self.store.as_ref(), Collection::Products).await?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn put(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.put(Collection::Products, product.id.into_inner(), encode(product)?);
        self.store.commit(batch).await?;
        Ok(())
    }
}
