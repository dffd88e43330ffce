//! Leafspring CRM Core - Shared types library.
//!
//! This crate provides common types used across all Leafspring CRM components:
//! - `server` - HTTP back end (CRUD, authentication, AI assistant)
//! - `cli` - Command-line tools for seeding data and asking the assistant
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no file access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, statuses, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
