//! Attachment storage on Rackspace Cloud Files.
//!
//! Provides:
//! - Credential resolution from YAML files, readers or inline maps
//! - Path and CDN URL templates
//! - Lazily created, public containers cached per backend
//! - Write flushing with bounded retry and a per-style report
//! - Fail-fast delete flushing

pub mod attachment;
pub mod config;
pub mod content_type;
pub mod credentials;
pub mod error;
pub mod flush;
pub mod logging;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod template;

pub use attachment::Attachment;
pub use config::{BackendOptions, ContainerName, StorageOptions};
pub use credentials::{CredentialSource, Credentials};
pub use error::{StorageError, StorageResult};
pub use flush::{FailedWrite, FlushReport};
pub use storage::{AttachmentStorage, RemoteObject, StorageBackend, StoredFile};
