//! Bearer-token authentication extractor.
//!
//! Every `/api/*` route except login takes [`RequireAuth`]; the token comes
//! from `Authorization: Bearer <token>` and is resolved against the session
//! cache, then against the store's users.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::set_sentry_user;
use crate::models::User;
use crate::state::AppState;
use crate::store::UserRepository;

/// The authenticated caller and the token they used.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(current): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", current.user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a request is not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bearer token was sent.
    MissingToken,
    /// The token is unknown or its session has expired.
    SessionExpired,
    /// The session's user no longer exists.
    UnknownUser,
}

impl AuthRejection {
    const fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Please log in first",
            Self::SessionExpired => "Login expired",
            Self::UnknownUser => "User does not exist",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": self.message() })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(AuthRejection::MissingToken)?
            .to_string();

        let user_id = state
            .sessions()
            .resolve(&token)
            .await
            .ok_or(AuthRejection::SessionExpired)?;

        let user = UserRepository::new(state.store())
            .get(&user_id)
            .ok_or(AuthRejection::UnknownUser)?;

        set_sentry_user(user.id.as_str(), &user.username);

        Ok(Self(CurrentUser { user, token }))
    }
}

/// The token of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
