//! JSON document store.
//!
//! The whole CRM lives in one JSON file (`CRM_DATA_FILE`). It is loaded into
//! memory at startup and rewritten after every successful mutation.
//!
//! # Concurrency
//!
//! - Records sit behind a `std::sync::RwLock`; guards never cross an `.await`.
//! - Mutations are serialized by a `tokio::sync::Mutex`. Each one edits a
//!   copy of the document and swaps it in only after the file write
//!   succeeded, so memory never runs ahead of disk.
//! - Writes go to a sibling temp file that is then renamed over the data file.
//!
//! Per-entity access goes through the repositories in this module, e.g.
//! [`CustomerRepository`].

pub mod customers;
pub mod inquiries;
pub mod orders;
pub mod products;
pub mod users;

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::models::{Customer, Inquiry, Order, Product, User, product};

pub use customers::{CustomerFilter, CustomerRepository};
pub use inquiries::{InquiryFilter, InquiryRepository};
pub use orders::{OrderFilter, OrderRepository};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data file or a record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Client-supplied fields do not form a valid record.
    #[error("invalid record: {0}")]
    Invalid(String),

    /// Uniqueness violation (e.g. duplicate username).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Client-supplied fields rejected while building or merging a record.
    pub(crate) fn invalid_record(err: &serde_json::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// A query filter value, treating an empty string as absent.
pub(crate) fn filter_value(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Everything persisted in the data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub inquiries: Vec<Inquiry>,
}

impl StoreData {
    /// A fresh document holding only the default product catalog.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            products: product::default_catalog(),
            ..Self::default()
        }
    }
}

/// Handle to the shared document store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    data: RwLock<StoreData>,
    write_lock: tokio::sync::Mutex<()>,
}

impl Store {
    /// Open the data file at `path`.
    ///
    /// A missing file is created with [`StoreData::seeded`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read or created, or
    /// `StoreError::Serialization` if it holds invalid JSON.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let store = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let data: StoreData = serde_json::from_slice(&bytes)?;
                info!(
                    customers = data.customers.len(),
                    products = data.products.len(),
                    orders = data.orders.len(),
                    inquiries = data.inquiries.len(),
                    "Data file loaded"
                );
                Self::with_data(path, data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Data file missing, creating it with the default catalog");
                let store = Self::with_data(path, StoreData::seeded());
                store.flush().await?;
                store
            }
            Err(e) => return Err(e.into()),
        };

        Ok(store)
    }

    /// Replace the data file at `path` with `data`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file cannot be written.
    pub async fn create(path: impl AsRef<Path>, data: StoreData) -> Result<Self, StoreError> {
        let store = Self::with_data(path.as_ref().to_path_buf(), data);
        store.flush().await?;
        Ok(store)
    }

    fn with_data(path: PathBuf, data: StoreData) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                data: RwLock::new(data),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // A poisoned lock still holds a consistent document: mutations replace
    // whole records and never panic half-way through a write.
    fn read_guard(&self) -> RwLockReadGuard<'_, StoreData> {
        self.inner.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.inner.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current document.
    pub fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> R {
        f(&self.read_guard())
    }

    /// Apply `f` to a copy of the document, persist it, then publish it.
    ///
    /// Readers only see the change once it is on disk. When `f` or the write
    /// fails, neither the file nor the in-memory document changes.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a `StoreError` if persisting fails.
    pub async fn mutate<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut StoreData) -> Result<R, E> + Send,
        R: Send,
        E: From<StoreError> + Send,
    {
        let _write = self.inner.write_lock.lock().await;

        let mut next = self.read(StoreData::clone);
        let result = f(&mut next)?;
        let bytes = serde_json::to_vec_pretty(&next).map_err(StoreError::from)?;

        self.write_file(&bytes).await?;
        *self.write_guard() = next;
        Ok(result)
    }

    /// Write the current document to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or the write fails.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let _write = self.inner.write_lock.lock().await;
        let bytes = self.read(serde_json::to_vec_pretty)?;
        self.write_file(&bytes).await
    }

    async fn write_file(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let path = &self.inner.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(bytes = bytes.len(), "Data file written");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::Store;

    /// A fresh store backed by a unique file in the system temp directory.
    pub async fn temp_store() -> (Store, PathBuf) {
        let path = std::env::temp_dir()
            .join(format!("leafspring-crm-{}", uuid::Uuid::new_v4()))
            .join("crm.json");
        let store = Store::open(&path).await.expect("open store");
        (store, path)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use super::*;

    #[tokio::test]
    async fn test_open_missing_file_seeds_catalog() {
        let (store, path) = temp_store().await;

        assert!(path.exists());
        assert_eq!(store.read(|d| d.products.len()), 5);
        assert_eq!(store.read(|d| d.customers.len()), 0);
    }

    #[tokio::test]
    async fn test_mutation_survives_reopen() {
        let (store, path) = temp_store().await;

        store
            .mutate(|d| {
                d.products.truncate(2);
                Ok::<_, StoreError>(())
            })
            .await
            .expect("mutate");

        let reopened = Store::open(&path).await.expect("reopen");
        assert_eq!(reopened.read(|d| d.products.len()), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_writes_nothing() {
        let (store, path) = temp_store().await;
        let before = std::fs::read(&path).expect("read");

        let result = store
            .mutate(|_| Err::<(), _>(StoreError::NotFound))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(std::fs::read(&path).expect("read"), before);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let (store, path) = temp_store().await;
        let before = std::fs::read(&path).expect("read");

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        std::fs::create_dir(&tmp).expect("block temp file");

        let result = store
            .mutate(|d| {
                d.products.clear();
                Ok::<_, StoreError>(())
            })
            .await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.read(|d| d.products.len()), 5);
        assert_eq!(std::fs::read(&path).expect("read"), before);

        std::fs::remove_dir(&tmp).expect("unblock temp file");
        store
            .mutate(|d| {
                d.products.truncate(4);
                Ok::<_, StoreError>(())
            })
            .await
            .expect("mutate");
        let reopened = Store::open(&path).await.expect("reopen");
        assert_eq!(reopened.read(|d| d.products.len()), 4);
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let (_, path) = temp_store().await;
        std::fs::write(&path, b"{not json").expect("write");

        let result = Store::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
