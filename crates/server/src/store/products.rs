//! Product catalog repository.

use serde_json::{Map, Value, json};
use tracing::instrument;

use leafspring_crm_core::ProductId;

use super::{Store, StoreError};
use crate::models::{Product, from_fields, merge_fields};

/// Repository for the product catalog.
pub struct ProductRepository<'a> {
    store: &'a Store,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The full catalog, in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Product> {
        self.store.read(|d| d.products.clone())
    }

    /// Add a product from client-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the fields do not form a product, or
    /// a persistence error.
    #[instrument(skip_all)]
    pub async fn create(&self, fields: Map<String, Value>) -> Result<Product, StoreError> {
        let product: Product = from_fields(fields, [("id", json!(ProductId::generate()))])
            .map_err(|e| StoreError::invalid_record(&e))?;

        self.store
            .mutate(|d| {
                d.products.push(product.clone());
                Ok::<_, StoreError>(())
            })
            .await?;

        Ok(product)
    }

    /// Shallow-merge `patch` into an existing product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown ID, `StoreError::Invalid`
    /// if the merged record is invalid, or a persistence error.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        patch: Map<String, Value>,
    ) -> Result<Product, StoreError> {
        self.store
            .mutate(|d| {
                let slot = d
                    .products
                    .iter_mut()
                    .find(|p| &p.id == id)
                    .ok_or(StoreError::NotFound)?;
                let merged = merge_fields(&*slot, patch).map_err(|e| StoreError::invalid_record(&e))?;
                *slot = merged.clone();
                Ok(merged)
            })
            .await
    }
}
