//! Inquiries.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde_json::{Map, Value};

use leafspring_crm_core::InquiryId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Inquiry;
use crate::routes::{ApiJson, DataResponse, ListResponse, store_error};
use crate::state::AppState;
use crate::store::{InquiryFilter, InquiryRepository};

/// Build the inquiries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inquiries", get(list).post(create))
        .route("/api/inquiries/{id}", put(update))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<InquiryFilter>,
) -> Json<ListResponse<Inquiry>> {
    Json(ListResponse::new(
        InquiryRepository::new(state.store()).list(&filter),
    ))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Inquiry>>, AppError> {
    let inquiry = InquiryRepository::new(state.store())
        .create(fields, &current.user.name)
        .await?;
    Ok(Json(DataResponse::with_message("Inquiry created", inquiry)))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<InquiryId>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<DataResponse<Inquiry>>, AppError> {
    let inquiry = InquiryRepository::new(state.store())
        .update(&id, patch)
        .await
        .map_err(store_error("Inquiry"))?;
    Ok(Json(DataResponse::with_message("Inquiry updated", inquiry)))
}
