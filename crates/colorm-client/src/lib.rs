//! colorm client - statement executors for the record mapper.
//!
//! This crate provides the execution side of colorm: a [`Session`] that
//! applies keyspace selection and request timeouts around any backend, and
//! [`MemoryStore`], an in-process backend for tests and local development.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use colorm_client::{ClientConfig, MemoryStore, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let session = Session::connect(store, ClientConfig::new().with_keyspace("app")).await?;
//!
//!     let model = colorm_core::Model::new(schema, Arc::new(session));
//!     model.create(colorm_core::record! { "email" => "a@b.com" }).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod session;

pub use config::ClientConfig;
pub use error::{Error, ParseError};
pub use memory::MemoryStore;
pub use session::Session;

/// Re-export protocol types.
pub use colorm_proto as proto;
