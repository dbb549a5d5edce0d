//! The object store seam.
//!
//! Everything above this trait (container registry, flushing, URL building)
//! is written against `dyn ObjectStore`, so tests can script failures
//! without a network.

use crate::error::RemoteResult;
use crate::types::{Container, PutOptions};
use async_trait::async_trait;
use std::path::Path;

/// Operations the attachment layer needs from a remote object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Opens a fresh authenticated session, discarding any previous one.
    ///
    /// Nothing from the old session (token, pooled sockets) is reused.
    async fn connect(&self) -> RemoteResult<()>;

    /// Creates a container. Creating an existing container returns it.
    async fn create_container(&self, name: &str) -> RemoteResult<Container>;

    /// Enables public CDN access and returns the container with its CDN URL.
    async fn make_public(&self, container: &Container) -> RemoteResult<Container>;

    async fn object_exists(&self, container: &Container, path: &str) -> RemoteResult<bool>;

    /// Uploads `local_path` to `path`, replacing any existing object.
    async fn put_file(
        &self,
        container: &Container,
        path: &str,
        local_path: &Path,
        options: &PutOptions,
    ) -> RemoteResult<()>;

    async fn get_object(&self, container: &Container, path: &str) -> RemoteResult<Vec<u8>>;

    /// Writes the object to `dest` and returns the number of bytes written.
    async fn download_object(
        &self,
        container: &Container,
        path: &str,
        dest: &Path,
    ) -> RemoteResult<u64> {
        let bytes = self.get_object(container, path).await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    async fn delete_object(&self, container: &Container, path: &str) -> RemoteResult<()>;
}
