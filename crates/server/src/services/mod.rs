//! Business logic services.

pub mod assistant;
pub mod auth;

pub use assistant::{AssistantError, AssistantService};
pub use auth::{AuthError, AuthService, NewUser, SessionStore};
