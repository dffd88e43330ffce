//! Read-only business data for prompts and dashboards.
//!
//! A [`BusinessSnapshot`] is an owned copy of the CRM records taken at one
//! instant. Callers decide how much of it to show; the snapshot itself is
//! never persisted or mutated.

use std::collections::BTreeMap;

use leafspring_crm_core::{CustomerId, InquiryStatus, OrderStatus};

use crate::models::{Customer, Inquiry, Order, Product};
use crate::store::Store;

/// Label used in breakdowns for records that leave a field empty.
pub const UNSPECIFIED: &str = "unspecified";

/// Source of business snapshots.
///
/// Each call to [`SnapshotProvider::snapshot`] reflects the data at that
/// moment; nothing is cached between calls.
pub trait SnapshotProvider: Send + Sync {
    /// Take a snapshot of the current data.
    fn snapshot(&self) -> BusinessSnapshot;
}

impl SnapshotProvider for Store {
    fn snapshot(&self) -> BusinessSnapshot {
        self.read(|d| BusinessSnapshot {
            customers: d.customers.clone(),
            products: d.products.clone(),
            orders: d.orders.clone(),
            inquiries: d.inquiries.clone(),
        })
    }
}

/// CRM records at one point in time, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BusinessSnapshot {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub inquiries: Vec<Inquiry>,
}

impl BusinessSnapshot {
    /// Customers per customer type.
    #[must_use]
    pub fn customers_by_type(&self) -> BTreeMap<String, usize> {
        tally(self.customers.iter().map(|c| c.customer_type.as_deref()))
    }

    /// Customers per value tier.
    #[must_use]
    pub fn customers_by_tier(&self) -> BTreeMap<String, usize> {
        tally(self.customers.iter().map(|c| c.tier.as_deref()))
    }

    /// Customers per country.
    #[must_use]
    pub fn customers_by_country(&self) -> BTreeMap<String, usize> {
        tally(self.customers.iter().map(|c| c.country.as_deref()))
    }

    /// Orders per status.
    #[must_use]
    pub fn orders_by_status(&self) -> BTreeMap<OrderStatus, usize> {
        let mut counts = BTreeMap::new();
        for order in &self.orders {
            *counts.entry(order.status).or_insert(0) += 1;
        }
        counts
    }

    /// Inquiries per status.
    #[must_use]
    pub fn inquiries_by_status(&self) -> BTreeMap<InquiryStatus, usize> {
        let mut counts = BTreeMap::new();
        for inquiry in &self.inquiries {
            *counts.entry(inquiry.status).or_insert(0) += 1;
        }
        counts
    }

    /// Number of orders still `pending`.
    #[must_use]
    pub fn pending_orders(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count()
    }

    /// Number of inquiries still `new`.
    #[must_use]
    pub fn new_inquiries(&self) -> usize {
        self.inquiries
            .iter()
            .filter(|i| i.status == InquiryStatus::New)
            .count()
    }

    /// The first `limit` customers.
    #[must_use]
    pub fn sample_customers(&self, limit: usize) -> &[Customer] {
        first(&self.customers, limit)
    }

    /// The first `limit` orders.
    #[must_use]
    pub fn sample_orders(&self, limit: usize) -> &[Order] {
        first(&self.orders, limit)
    }

    /// The first `limit` inquiries.
    #[must_use]
    pub fn sample_inquiries(&self, limit: usize) -> &[Inquiry] {
        first(&self.inquiries, limit)
    }

    /// The last `limit` orders, newest first.
    #[must_use]
    pub fn recent_orders(&self, limit: usize) -> Vec<&Order> {
        self.orders.iter().rev().take(limit).collect()
    }

    /// The last `limit` inquiries, newest first.
    #[must_use]
    pub fn recent_inquiries(&self, limit: usize) -> Vec<&Inquiry> {
        self.inquiries.iter().rev().take(limit).collect()
    }

    /// Look up one customer.
    #[must_use]
    pub fn customer(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| &c.id == id)
    }

    /// Orders placed by `id`.
    #[must_use]
    pub fn orders_for(&self, id: &CustomerId) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.is_for(id)).collect()
    }

    /// Inquiries sent by `id`.
    #[must_use]
    pub fn inquiries_for(&self, id: &CustomerId) -> Vec<&Inquiry> {
        self.inquiries.iter().filter(|i| i.is_for(id)).collect()
    }
}

fn first<T>(items: &[T], limit: usize) -> &[T] {
    items.get(..limit).unwrap_or(items)
}

fn tally<'a>(values: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        let key = value.filter(|v| !v.is_empty()).unwrap_or(UNSPECIFIED);
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::json;

    use super::BusinessSnapshot;
    use crate::models::product;

    /// A small, fixed data set.
    pub fn snapshot() -> BusinessSnapshot {
        let customers = json!([
            {"id": "c1", "name": "Ana Silva", "company": "Frota Sul", "country": "Brazil",
             "customerType": "dealer", "tier": "A", "createdAt": "2024-01-05T08:00:00Z"},
            {"id": "c2", "name": "Omar Haddad", "company": "Gulf Cargo", "country": "UAE",
             "customerType": "fleet", "tier": "B", "createdAt": "2024-02-10T08:00:00Z"},
            {"id": "c3", "name": "Bruno Costa", "country": "Brazil",
             "createdAt": "2024-03-15T08:00:00Z"}
        ]);
        let orders = json!([
            {"id": "ORD1", "customerId": "c1", "productName": "Heavy truck leaf spring",
             "quantity": 20, "totalAmount": "18000", "status": "completed",
             "createdAt": "2024-02-01T08:00:00Z"},
            {"id": "ORD2", "customerId": "c1", "productName": "Trailer leaf spring",
             "quantity": 8, "status": "pending", "createdAt": "2024-04-01T08:00:00Z"},
            {"id": "ORD3", "customerId": "c2", "status": "shipped",
             "createdAt": "2024-04-02T08:00:00Z"}
        ]);
        let inquiries = json!([
            {"id": "INQ1", "customerId": "c2", "product": "Bus leaf spring",
             "content": "Need a quote for 500 sets", "status": "new",
             "createdAt": "2024-04-03T08:00:00Z"},
            {"id": "INQ2", "customerId": "c3", "status": "following",
             "createdAt": "2024-04-04T08:00:00Z"}
        ]);

        BusinessSnapshot {
            customers: serde_json::from_value(customers).expect("customers"),
            products: product::default_catalog(),
            orders: serde_json::from_value(orders).expect("orders"),
            inquiries: serde_json::from_value(inquiries).expect("inquiries"),
        }
    }
}
