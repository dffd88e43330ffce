//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! crm-cli user create -u maria -n "Maria Lopes" -r staff -p 'long-password'
//! ```

use std::path::Path;

use secrecy::SecretString;

use leafspring_crm_core::UserRole;
use leafspring_crm_server::config::CrmConfig;
use leafspring_crm_server::models::User;
use leafspring_crm_server::services::{AuthService, NewUser, SessionStore};
use leafspring_crm_server::store::Store;

use super::CliError;

/// Create a user in the data file.
///
/// # Errors
///
/// Returns `CliError::InvalidRole` for an unknown role, or the
/// authentication service's error (duplicate username, weak password).
pub async fn create_user(
    config: &CrmConfig,
    data_file: &Path,
    username: &str,
    name: &str,
    role: &str,
    password: SecretString,
) -> Result<User, CliError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let store = Store::open(data_file).await?;
    let sessions = SessionStore::new(config.auth.session_ttl);

    let user = AuthService::new(&store, &sessions)
        .create_user(NewUser {
            username,
            name,
            role,
            password: &password,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(user)
}
