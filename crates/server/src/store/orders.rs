//! Order repository.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use leafspring_crm_core::{OrderId, OrderStatus};

use super::{Store, StoreError, filter_value};
use crate::models::{Order, from_fields};

/// Query parameters for listing orders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    /// Exact status.
    pub status: Option<String>,
    /// Owning customer.
    pub customer_id: Option<String>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        filter_value(self.status.as_ref()).is_none_or(|s| order.status.as_str() == s)
            && filter_value(self.customer_id.as_ref())
                .is_none_or(|c| order.customer_id.as_ref().is_some_and(|id| id.as_str() == c))
    }
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    store: &'a Store,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// List orders matching `filter`, oldest first.
    #[must_use]
    pub fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        self.store.read(|d| {
            d.orders
                .iter()
                .filter(|o| filter.matches(o))
                .cloned()
                .collect()
        })
    }

    /// Create an order in the `pending` state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the fields do not form an order, or a
    /// persistence error.
    #[instrument(skip(self, fields))]
    pub async fn create(
        &self,
        fields: Map<String, Value>,
        created_by: &str,
    ) -> Result<Order, StoreError> {
        let order: Order = from_fields(
            fields,
            [
                ("id", json!(OrderId::generate())),
                ("status", json!(OrderStatus::Pending)),
                ("createdAt", json!(Utc::now())),
                ("createdBy", json!(created_by)),
            ],
        )
        .map_err(|e| StoreError::invalid_record(&e))?;

        self.store
            .mutate(|d| {
                d.orders.push(order.clone());
                Ok::<_, StoreError>(())
            })
            .await?;

        Ok(order)
    }

    /// Move an order to `status`.
    ///
    /// Any transition is allowed, including back to `pending`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown ID, or a persistence error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        self.store
            .mutate(|d| {
                let order = d
                    .orders
                    .iter_mut()
                    .find(|o| &o.id == id)
                    .ok_or(StoreError::NotFound)?;
                order.status = status;
                order.updated_at = Some(Utc::now());
                Ok(order.clone())
            })
            .await
    }
}
