//! # geostac-core
//!
//! Shared infrastructure for the geostac catalog builder:
//!
//! - **Storage**: the [`storage::ObjectStore`] trait over the object store
//!   holding published documents, with an in-memory backend for tests
//! - **Paths**: the canonical persisted key layout ([`paths::StacPaths`])
//! - **Config**: explicit runtime configuration ([`config::Config`])
//! - **Errors**: shared error types ([`error::Error`])
//! - **Observability**: `tracing` initialization helpers

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod observability;
pub mod paths;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use paths::StacPaths;
pub use storage::{MemoryStore, ObjectStore, S3Store};
