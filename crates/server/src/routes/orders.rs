//! Orders.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use leafspring_crm_core::{OrderId, OrderStatus};

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::routes::{ApiJson, DataResponse, ListResponse, store_error};
use crate::state::AppState;
use crate::store::{OrderFilter, OrderRepository};

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(create))
        .route("/api/orders/{id}/status", put(set_status))
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<OrderFilter>,
) -> Json<ListResponse<Order>> {
    Json(ListResponse::new(OrderRepository::new(state.store()).list(&filter)))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Order>>, AppError> {
    let order = OrderRepository::new(state.store())
        .create(fields, &current.user.name)
        .await?;
    Ok(Json(DataResponse::with_message("Order created", order)))
}

async fn set_status(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<OrderId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<DataResponse<Order>>, AppError> {
    let order = OrderRepository::new(state.store())
        .set_status(&id, update.status)
        .await
        .map_err(store_error("Order"))?;
    Ok(Json(DataResponse::with_message("Order status updated", order)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{logged_in_app, send};

    #[tokio::test]
    async fn test_order_flow() {
        let (app, _, token) = logged_in_app().await;
        let token = Some(token.as_str());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/orders",
            token,
            Some(json!({
                "customerId": "c1",
                "customerName": "Ana Silva",
                "productName": "Heavy truck leaf spring",
                "quantity": 20,
                "status": "shipped"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "pending");
        let id = body["data"]["id"].as_str().expect("id").to_string();
        assert!(id.starts_with("ORD"));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/orders/{id}/status"),
            token,
            Some(json!({ "status": "producing" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "producing");

        let (_, body) = send(&app, Method::GET, "/api/orders?status=producing", token, None).await;
        assert_eq!(body["total"], 1);
        let (_, body) = send(&app, Method::GET, "/api/orders?customerId=c2", token, None).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_status_of_unknown_order() {
        let (app, _, token) = logged_in_app().await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/orders/ORD0/status",
            Some(&token),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }
}
