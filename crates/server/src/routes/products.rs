//! Product catalog.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use serde_json::{Map, Value};

use leafspring_crm_core::ProductId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::routes::{ApiJson, DataResponse, ListResponse, store_error};
use crate::state::AppState;
use crate::store::ProductRepository;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", put(update))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> Json<ListResponse<Product>> {
    Json(ListResponse::new(ProductRepository::new(state.store()).list()))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Product>>, AppError> {
    let product = ProductRepository::new(state.store()).create(fields).await?;
    Ok(Json(DataResponse::with_message("Product created", product)))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<ProductId>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Product>>, AppError> {
    let product = ProductRepository::new(state.store())
        .update(&id, patch)
        .await
        .map_err(store_error("Product"))?;
    Ok(Json(DataResponse::with_message("Product updated", product)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{logged_in_app, send};

    #[tokio::test]
    async fn test_catalog_is_seeded() {
        let (app, _, token) = logged_in_app().await;
        let (status, body) = send(&app, Method::GET, "/api/products", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["data"][0]["id"], "P001");
    }

    #[tokio::test]
    async fn test_create_and_update_product() {
        let (app, _, token) = logged_in_app().await;
        let token = Some(token.as_str());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            token,
            Some(json!({ "name": "Parabolic spring", "price": "1250.50" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["id"].as_str().expect("id").to_string();
        assert!(id.starts_with('P'));
        assert_eq!(body["data"]["price"], "1250.50");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/products/{id}"),
            token,
            Some(json!({ "unit": "set" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["unit"], "set");
        assert_eq!(body["data"]["name"], "Parabolic spring");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/products/P999",
            token,
            Some(json!({ "unit": "set" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
    }
}
