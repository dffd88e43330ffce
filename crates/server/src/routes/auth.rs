//! Login, current user and logout.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::UserView;
use crate::routes::{ApiJson, MessageResponse};
use crate::services::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/me", get(me))
        .route("/api/logout", post(logout))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserView,
}

/// The current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserView,
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = AuthService::new(state.store(), state.sessions())
        .login(&form.username, &form.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserView::from(&user),
    }))
}

async fn me(RequireAuth(current): RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user: UserView::from(&current.user),
    })
}

async fn logout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Json<MessageResponse> {
    AuthService::new(state.store(), state.sessions())
        .logout(&current.token)
        .await;
    Json(MessageResponse::new("Logged out"))
}
