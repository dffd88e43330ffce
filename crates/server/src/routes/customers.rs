//! Customer CRUD.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde_json::{Map, Value};

use leafspring_crm_core::CustomerId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Customer;
use crate::routes::{ApiJson, DataResponse, ListResponse, MessageResponse, store_error};
use crate::state::AppState;
use crate::store::{CustomerFilter, CustomerRepository};

const ENTITY: &str = "Customer";

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<CustomerFilter>,
) -> Json<ListResponse<Customer>> {
    Json(ListResponse::new(
        CustomerRepository::new(state.store()).list(&filter),
    ))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Customer>>, AppError> {
    let customer = CustomerRepository::new(state.store())
        .create(fields, &current.user.name)
        .await?;
    Ok(Json(DataResponse::with_message("Customer created", customer)))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<CustomerId>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Customer>>, AppError> {
    let customer = CustomerRepository::new(state.store())
        .update(&id, patch)
        .await
        .map_err(store_error(ENTITY))?;
    Ok(Json(DataResponse::with_message("Customer updated", customer)))
}

async fn remove(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<CustomerId>,
) -> Result<Json<MessageResponse>, AppError> {
    CustomerRepository::new(state.store())
        .delete(&id)
        .await
        .map_err(store_error(ENTITY))?;
    Ok(Json(MessageResponse::new("Customer deleted")))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{logged_in_app, send};

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let (app, _, token) = logged_in_app().await;
        let token = Some(token.as_str());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/customers",
            token,
            Some(json!({ "name": "Ana Silva", "company": "Frota Sul", "country": "Brazil", "source": "fair" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["createdBy"], "Maria Lopes");
        assert_eq!(body["data"]["source"], "fair");
        let id = body["data"]["id"].as_str().expect("id").to_string();

        let (_, body) = send(&app, Method::GET, "/api/customers?search=frota", token, None).await;
        assert_eq!(body["total"], 1);

        let (_, body) = send(&app, Method::GET, "/api/customers?country=Chile", token, None).await;
        assert_eq!(body["total"], 0);

        let uri = format!("/api/customers/{id}");
        let (status, body) =
            send(&app, Method::PUT, &uri, token, Some(json!({ "tier": "A", "id": "hijack" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["tier"], "A");
        assert_eq!(body["data"]["id"], id.as_str());
        assert!(body["data"]["updatedAt"].is_string());

        let (status, _) = send(&app, Method::DELETE, &uri, token, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::DELETE, &uri, token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Customer not found");
    }

    #[tokio::test]
    async fn test_update_unknown_customer() {
        let (app, _, token) = logged_in_app().await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/customers/c-missing",
            Some(&token),
            Some(json!({ "tier": "B" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
