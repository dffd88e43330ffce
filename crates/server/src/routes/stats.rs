//! Dashboard statistics.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::middleware::RequireAuth;
use crate::models::{Inquiry, Order};
use crate::routes::DataResponse;
use crate::snapshot::{BusinessSnapshot, SnapshotProvider};
use crate::state::AppState;

/// Number of recent orders and inquiries shown on the dashboard.
const RECENT: usize = 5;

/// Build the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(stats))
}

/// Dashboard figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_customers: usize,
    pub total_orders: usize,
    pub total_inquiries: usize,
    pub pending_orders: usize,
    pub new_inquiries: usize,
    pub customer_countries: BTreeMap<String, usize>,
    pub recent_orders: Vec<Order>,
    pub recent_inquiries: Vec<Inquiry>,
}

impl From<&BusinessSnapshot> for Stats {
    fn from(snapshot: &BusinessSnapshot) -> Self {
        Self {
            total_customers: snapshot.customers.len(),
            total_orders: snapshot.orders.len(),
            total_inquiries: snapshot.inquiries.len(),
            pending_orders: snapshot.pending_orders(),
            new_inquiries: snapshot.new_inquiries(),
            customer_countries: snapshot.customers_by_country(),
            recent_orders: snapshot.recent_orders(RECENT).into_iter().cloned().collect(),
            recent_inquiries: snapshot
                .recent_inquiries(RECENT)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

async fn stats(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> Json<DataResponse<Stats>> {
    let snapshot = state.store().snapshot();
    Json(DataResponse::new(Stats::from(&snapshot)))
}
