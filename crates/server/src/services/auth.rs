//! Authentication service.
//!
//! Username/password login with Argon2id hashes, and opaque bearer tokens
//! held in an in-memory session cache that expires them after a fixed TTL.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument};

use leafspring_crm_core::{UserId, UserRole};

use crate::models::User;
use crate::store::{Store, StoreError, UserRepository};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Username of the user seeded into an empty store.
pub const ADMIN_USERNAME: &str = "admin";

/// Upper bound on concurrently live sessions.
const MAX_SESSIONS: u64 = 10_000;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Username or display name missing.
    #[error("invalid user: {0}")]
    InvalidUser(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

// =============================================================================
// Sessions
// =============================================================================

/// Live login sessions, keyed by bearer token.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, UserId>,
}

impl SessionStore {
    /// Create a session store whose tokens expire `ttl` after login.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Start a session for `user_id` and return its token.
    pub async fn create(&self, user_id: UserId) -> String {
        let token = generate_token();
        self.cache.insert(token.clone(), user_id).await;
        token
    }

    /// The user a live token belongs to.
    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.cache.get(token).await
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) {
        self.cache.invalidate(token).await;
    }
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// Service
// =============================================================================

/// Input for creating a user.
#[derive(Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub role: UserRole,
    pub password: &'a SecretString,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: &'a SessionStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a Store, sessions: &'a SessionStore) -> Self {
        Self {
            users: UserRepository::new(store),
            sessions,
        }
    }

    /// Check a username and password and open a session.
    ///
    /// Returns the bearer token and the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = self
            .users
            .get_by_username(username.trim())
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let token = self.sessions.create(user.id.clone()).await;
        info!(user_id = %user.id, "User logged in");
        Ok((token, user))
    }

    /// End the session behind `token`.
    pub async fn logout(&self, token: &str) {
        self.sessions.revoke(token).await;
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUser` for a blank username or name,
    /// `AuthError::WeakPassword` for a short password, or
    /// `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, AuthError> {
        let username = new_user.username.trim();
        let name = new_user.name.trim();
        if username.is_empty() || name.is_empty() {
            return Err(AuthError::InvalidUser(
                "username and name are required".to_string(),
            ));
        }

        let password = new_user.password.expose_secret();
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = User {
            id: UserId::generate(),
            username: username.to_string(),
            name: name.to_string(),
            role: new_user.role,
            password_hash,
            created_at: Utc::now(),
        };

        self.users.create(user).await.map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })
    }

    /// Seed the `admin` user when the store has no users at all.
    ///
    /// Returns the created user, or `None` if users already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be created.
    pub async fn ensure_admin(&self, password: &SecretString) -> Result<Option<User>, AuthError> {
        if self.users.count() > 0 {
            return Ok(None);
        }

        let user = self
            .create_user(NewUser {
                username: ADMIN_USERNAME,
                name: "Administrator",
                role: UserRole::Admin,
                password,
            })
            .await?;
        info!(username = ADMIN_USERNAME, "Seeded admin user");
        Ok(Some(user))
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;

    fn sessions() -> SessionStore {
        SessionStore::new(Duration::from_secs(3600))
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("leaf-spring-2024").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("leaf-spring-2024", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let sessions = sessions();
        let token = sessions.create(UserId::new("u1")).await;

        assert_eq!(sessions.resolve(&token).await, Some(UserId::new("u1")));
        sessions.revoke(&token).await;
        assert_eq!(sessions.resolve(&token).await, None);
        assert_eq!(sessions.resolve("unknown").await, None);
    }

    #[tokio::test]
    async fn test_ensure_admin_then_login() {
        let (store, _) = temp_store().await;
        let sessions = sessions();
        let auth = AuthService::new(&store, &sessions);
        let password = SecretString::from("Zq8#Lw2!vR5m");

        let admin = auth.ensure_admin(&password).await.expect("seed");
        assert_eq!(admin.map(|u| u.role), Some(UserRole::Admin));
        assert!(auth.ensure_admin(&password).await.expect("seed").is_none());

        let (token, user) = auth.login("admin", "Zq8#Lw2!vR5m").await.expect("login");
        assert_eq!(sessions.resolve(&token).await, Some(user.id));

        assert!(matches!(
            auth.login("admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "Zq8#Lw2!vR5m").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (store, _) = temp_store().await;
        let sessions = sessions();
        let auth = AuthService::new(&store, &sessions);
        let password = SecretString::from("long-enough-pw");

        let new_user = NewUser {
            username: "lina",
            name: "Lina Wu",
            role: UserRole::Staff,
            password: &password,
        };
        auth.create_user(new_user.clone()).await.expect("create");

        assert!(matches!(
            auth.create_user(new_user.clone()).await,
            Err(AuthError::UserAlreadyExists)
        ));

        let short = SecretString::from("short");
        assert!(matches!(
            auth.create_user(NewUser {
                username: "max",
                password: &short,
                ..new_user.clone()
            })
            .await,
            Err(AuthError::WeakPassword(_))
        ));

        assert!(matches!(
            auth.create_user(NewUser {
                username: "  ",
                ..new_user
            })
            .await,
            Err(AuthError::InvalidUser(_))
        ));
    }
}
