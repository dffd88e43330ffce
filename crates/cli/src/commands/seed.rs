//! Write a fresh data file.
//!
//! # Usage
//!
//! ```bash
//! crm-cli seed            # refuses to overwrite an existing file
//! crm-cli seed --force
//! ```

use std::path::Path;

use leafspring_crm_server::config::CrmConfig;
use leafspring_crm_server::services::{AuthService, SessionStore};
use leafspring_crm_server::store::{Store, StoreData};

use super::CliError;

/// Seed `data_file` with the default catalog and the `admin` user.
///
/// # Errors
///
/// Returns `CliError::DataFileExists` if the file exists and `force` is not
/// set, or an error if writing the file or creating the user fails.
pub async fn run(config: &CrmConfig, data_file: &Path, force: bool) -> Result<(), CliError> {
    if !force && tokio::fs::try_exists(data_file).await.unwrap_or(false) {
        return Err(CliError::DataFileExists(data_file.to_path_buf()));
    }

    tracing::info!("Writing seed data to {}", data_file.display());
    let store = Store::create(data_file, StoreData::seeded()).await?;

    let sessions = SessionStore::new(config.auth.session_ttl);
    AuthService::new(&store, &sessions)
        .ensure_admin(&config.auth.admin_password)
        .await?;

    let products = store.read(|d| d.products.len());
    tracing::info!("Seeded {} products and the admin user", products);
    if config.auth.admin_password_is_default {
        tracing::warn!("Admin password is the default; set CRM_ADMIN_PASSWORD before seeding");
    }

    Ok(())
}
