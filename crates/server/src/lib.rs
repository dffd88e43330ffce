//! Leafspring CRM server library.
//!
//! JSON API over a single-file document store, plus a business assistant
//! that answers questions about the CRM data through an external
//! chat-completion API.
//!
//! The library form lets the CLI reuse the store and assistant, and lets the
//! integration tests boot the full router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod services;
pub mod snapshot;
pub mod state;
pub mod store;
