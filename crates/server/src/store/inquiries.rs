//! Inquiry repository.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use leafspring_crm_core::{InquiryId, InquiryStatus};

use super::{Store, StoreError, filter_value};
use crate::models::{Inquiry, from_fields, merge_fields};

/// Query parameters for listing inquiries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InquiryFilter {
    /// Exact status.
    pub status: Option<String>,
}

/// Repository for inquiries.
pub struct InquiryRepository<'a> {
    store: &'a Store,
}

impl<'a> InquiryRepository<'a> {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List inquiries matching `filter`, oldest first.
    #[must_use]
    pub fn list(&self, filter: &InquiryFilter) -> Vec<Inquiry> {
        let status = filter_value(filter.status.as_ref());
        self.store.read(|d| {
            d.inquiries
                .iter()
                .filter(|i| status.is_none_or(|s| i.status.as_str() == s))
                .cloned()
                .collect()
        })
    }

    /// Record a new inquiry in the `new` state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the fields do not form an inquiry, or
    /// a persistence error.
    #[instrument(skip(self, fields))]
    pub async fn create(
        &self,
        fields: Map<String, Value>,
        created_by: &str,
    ) -> Result<Inquiry, StoreError> {
        let inquiry: Inquiry = from_fields(
            fields,
            [
                ("id", json!(InquiryId::generate())),
                ("status", json!(InquiryStatus::New)),
                ("createdAt", json!(Utc::now())),
                ("createdBy", json!(created_by)),
            ],
        )
        .map_err(|e| StoreError::invalid_record(&e))?;

        self.store
            .mutate(|d| {
                d.inquiries.push(inquiry.clone());
                Ok::<_, StoreError>(())
            })
            .await?;

        Ok(inquiry)
    }

    /// Shallow-merge `patch` into an existing inquiry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown ID, `StoreError::Invalid`
    /// if the merged record is invalid, or a persistence error.
    #[instrument(skip(self, patch), fields(inquiry_id = %id))]
    pub async fn update(
        &self,
        id: &InquiryId,
        mut patch: Map<String, Value>,
    ) -> Result<Inquiry, StoreError> {
        patch.insert("updatedAt".to_string(), json!(Utc::now()));

        self.store
            .mutate(|d| {
                let slot = d
                    .inquiries
                    .iter_mut()
                    .find(|i| &i.id == id)
                    .ok_or(StoreError::NotFound)?;
                let merged = merge_fields(&*slot, patch).map_err(|e| StoreError::invalid_record(&e))?;
                *slot = merged.clone();
                Ok(merged)
            })
            .await
    }
}
