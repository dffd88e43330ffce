//! User repository.

use tracing::instrument;

use leafspring_crm_core::UserId;

use super::{Store, StoreError};
use crate::models::User;

/// Repository for CRM users.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a user by ID.
    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<User> {
        self.store
            .read(|d| d.users.iter().find(|u| &u.id == id).cloned())
    }

    /// Get a user by username.
    #[must_use]
    pub fn get_by_username(&self, username: &str) -> Option<User> {
        self.store
            .read(|d| d.users.iter().find(|u| u.username == username).cloned())
    }

    /// Number of users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store.read(|d| d.users.len())
    }

    /// Add a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken, or a
    /// persistence error.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create(&self, user: User) -> Result<User, StoreError> {
        self.store
            .mutate(|d| {
                if d.users.iter().any(|u| u.username == user.username) {
                    return Err(StoreError::Conflict(format!(
                        "username '{}' already exists",
                        user.username
                    )));
                }
                d.users.push(user.clone());
                Ok(user)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use leafspring_crm_core::UserRole;

    use super::*;
    use crate::store::test_support::temp_store;

    fn user(username: &str) -> User {
        User {
            id: UserId::generate(),
            username: username.to_string(),
            name: "Maria Lopes".to_string(),
            role: UserRole::Staff,
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (store, _) = temp_store().await;
        let repo = UserRepository::new(&store);

        let created = repo.create(user("maria")).await.expect("create");

        assert_eq!(repo.count(), 1);
        assert_eq!(repo.get(&created.id).map(|u| u.username), Some("maria".to_string()));
        assert!(repo.get_by_username("maria").is_some());
        assert!(repo.get_by_username("MARIA").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let (store, _) = temp_store().await;
        let repo = UserRepository::new(&store);

        repo.create(user("maria")).await.expect("create");
        let err = repo.create(user("maria")).await.expect_err("duplicate");

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(repo.count(), 1);
    }
}
