//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (all origins)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireAuth`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, CurrentUser, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
