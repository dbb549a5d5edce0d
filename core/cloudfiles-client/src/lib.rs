//! Rackspace Cloud Files client.
//!
//! Provides:
//! - `ObjectStore`, the trait attachment storage is written against
//! - `CloudFilesClient`, an HTTP implementation (identity v2.0 + Swift v1)
//! - `RemoteError`, classified into transient and permanent failures

pub mod client;
pub mod error;
pub mod store;
pub mod types;

pub use client::CloudFilesClient;
pub use error::{RemoteError, RemoteResult};
pub use store::ObjectStore;
pub use types::*;
