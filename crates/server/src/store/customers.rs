//! Customer repository.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use leafspring_crm_core::CustomerId;

use super::{Store, StoreError, filter_value};
use crate::models::{Customer, from_fields, merge_fields};

/// Query parameters for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Case-insensitive substring of name, company or email.
    pub search: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Exact country.
    pub country: Option<String>,
}

impl CustomerFilter {
    fn matches(&self, customer: &Customer) -> bool {
        let keyword = filter_value(self.search.as_ref()).map(str::to_lowercase);
        keyword.is_none_or(|k| customer.matches_keyword(&k))
            && filter_value(self.status.as_ref())
                .is_none_or(|s| customer.status.as_deref() == Some(s))
            && filter_value(self.country.as_ref())
                .is_none_or(|c| customer.country.as_deref() == Some(c))
    }
}

/// Repository for customer records.
pub struct CustomerRepository<'a> {
    store: &'a Store,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List customers matching `filter`, in insertion order.
    #[must_use]
    pub fn list(&self, filter: &CustomerFilter) -> Vec<Customer> {
        self.store.read(|d| {
            d.customers
                .iter()
                .filter(|c| filter.matches(c))
                .cloned()
                .collect()
        })
    }

    /// Create a customer from client-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the fields do not form a customer, or
    /// a persistence error.
    #[instrument(skip(self, fields))]
    pub async fn create(
        &self,
        fields: Map<String, Value>,
        created_by: &str,
    ) -> Result<Customer, StoreError> {
        let customer: Customer = from_fields(
            fields,
            [
                ("id", json!(CustomerId::generate())),
                ("createdAt", json!(Utc::now())),
                ("createdBy", json!(created_by)),
            ],
        )
        .map_err(|e| StoreError::invalid_record(&e))?;

        self.store
            .mutate(|d| {
                d.customers.push(customer.clone());
                Ok::<_, StoreError>(())
            })
            .await?;

        Ok(customer)
    }

    /// Shallow-merge `patch` into an existing customer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown ID, `StoreError::Invalid`
    /// if the merged record is invalid, or a persistence error.
    #[instrument(skip(self, patch), fields(customer_id = %id))]
    pub async fn update(
        &self,
        id: &CustomerId,
        mut patch: Map<String, Value>,
    ) -> Result<Customer, StoreError> {
        patch.insert("updatedAt".to_string(), json!(Utc::now()));

        self.store
            .mutate(|d| {
                let slot = d
                    .customers
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or(StoreError::NotFound)?;
                let merged = merge_fields(&*slot, patch).map_err(|e| StoreError::invalid_record(&e))?;
                *slot = merged.clone();
                Ok(merged)
            })
            .await
    }

    /// Delete a customer.
    ///
    /// Orders and inquiries referring to the customer are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown ID, or a persistence error.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete(&self, id: &CustomerId) -> Result<(), StoreError> {
        self.store
            .mutate(|d| {
                let index = d
                    .customers
                    .iter()
                    .position(|c| &c.id == id)
                    .ok_or(StoreError::NotFound)?;
                d.customers.remove(index);
                Ok(())
            })
            .await
    }
}
