//! Attachment storage on Cloud Files.
//!
//! `StorageBackend` is shared by every attachment of one kind: it owns the
//! store, the container cache and the options. `AttachmentStorage` is one
//! attachment on one record and owns that attachment's pending work.

use crate::attachment::Attachment;
use crate::config::{ContainerName, StorageOptions};
use crate::content_type::content_type_for;
use crate::credentials::CredentialSource;
use crate::error::{StorageError, StorageResult};
use crate::flush::{FlushReport, RetryPolicy, WriteJob, write_with_retry};
use crate::queue::PendingQueue;
use crate::registry::ContainerRegistry;
use crate::template::{interpolate, render_url};
use cloudfiles_client::{CloudFilesClient, Container, ObjectStore, PutOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Store, container cache and options shared across attachments.
pub struct StorageBackend {
    store: Arc<dyn ObjectStore>,
    registry: ContainerRegistry,
    container: ContainerName,
    options: StorageOptions,
    url_template: String,
}

impl StorageBackend {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: ContainerName,
        options: StorageOptions,
    ) -> StorageResult<Self> {
        options.validate()?;
        let url_template = options.url_template();
        Ok(Self {
            registry: ContainerRegistry::new(store.clone()),
            store,
            container,
            options,
            url_template,
        })
    }

    /// Builds a backend talking to Cloud Files with the given credentials.
    ///
    /// Without an explicit container the credentials' `container` key is used.
    pub fn from_credentials(
        source: CredentialSource,
        container: Option<ContainerName>,
        options: StorageOptions,
    ) -> StorageResult<Self> {
        let credentials = source.resolve(options.environment.as_deref())?;
        let container = container
            .or_else(|| credentials.container.clone().map(ContainerName::Literal))
            .ok_or_else(|| {
                StorageError::Config("no container configured or in credentials".into())
            })?;

        let client = CloudFilesClient::new(options.client_config(&credentials));
        info!(
            "cloud files storage for {} (servicenet: {})",
            credentials.username, credentials.servicenet
        );
        Self::new(Arc::new(client), container, options)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn path_template(&self) -> &str {
        self.options.path_template()
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn container_name(&self, attachment: &Attachment) -> String {
        self.container.for_attachment(attachment)
    }

    /// Storage for one attachment, sharing this backend.
    pub fn attach(self: &Arc<Self>, attachment: Attachment) -> AttachmentStorage {
        AttachmentStorage::new(self.clone(), attachment)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.options.max_attempts,
            delay: self.options.retry_delay(),
        }
    }
}

/// A stored file as returned by [`AttachmentStorage::to_file`].
pub enum StoredFile {
    /// Queued locally and not yet flushed.
    Pending(PathBuf),
    Remote(RemoteObject),
}

impl StoredFile {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Reads the whole file, from disk or from the store.
    pub async fn read(&self) -> StorageResult<Vec<u8>> {
        match self {
            Self::Pending(path) => Ok(tokio::fs::read(path).await?),
            Self::Remote(object) => object.bytes().await,
        }
    }
}

/// Handle to an object in the store.
pub struct RemoteObject {
    store: Arc<dyn ObjectStore>,
    container: Arc<Container>,
    path: String,
}

impl RemoteObject {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub async fn bytes(&self) -> StorageResult<Vec<u8>> {
        Ok(self.store.get_object(&self.container, &self.path).await?)
    }

    /// Streams the object into `dest`, returning the bytes written.
    pub async fn download_to(&self, dest: &Path) -> StorageResult<u64> {
        Ok(self
            .store
            .download_object(&self.container, &self.path, dest)
            .await?)
    }
}

/// One attachment on one record.
pub struct AttachmentStorage {
    backend: Arc<StorageBackend>,
    attachment: Attachment,
    queue: PendingQueue,
}

impl AttachmentStorage {
    pub fn new(backend: Arc<StorageBackend>, attachment: Attachment) -> Self {
        Self {
            backend,
            attachment,
            queue: PendingQueue::new(),
        }
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Remote path of `style`.
    pub fn path(&self, style: &str) -> String {
        interpolate(self.backend.path_template(), &self.attachment, style)
    }

    pub async fn container(&self) -> StorageResult<Arc<Container>> {
        let name = self.backend.container_name(&self.attachment);
        self.backend.registry.resolve(&name).await
    }

    /// Public URL of `style`.
    pub async fn url(&self, style: &str) -> StorageResult<String> {
        let container = self.container().await?;
        let cdn_base = container.cdn_base_url().ok_or_else(|| {
            StorageError::Config(format!("container {} has no CDN URL", container.name))
        })?;
        Ok(render_url(
            self.backend.url_template(),
            cdn_base,
            &self.path(style),
            &self.attachment,
            style,
        ))
    }

    /// Asks the store whether `style` has been persisted.
    pub async fn exists(&self, style: &str) -> StorageResult<bool> {
        let container = self.container().await?;
        Ok(self
            .backend
            .store
            .object_exists(&container, &self.path(style))
            .await?)
    }

    /// The file for `style`: the queued local file if a write is pending,
    /// otherwise a handle to the stored object.
    pub async fn to_file(&self, style: &str) -> StorageResult<StoredFile> {
        if let Some(local) = self.queue.pending_write(style) {
            debug!("{style} has a pending write, serving {}", local.display());
            return Ok(StoredFile::Pending(local.to_path_buf()));
        }
        Ok(StoredFile::Remote(RemoteObject {
            store: self.backend.store.clone(),
            container: self.container().await?,
            path: self.path(style),
        }))
    }

    pub async fn to_io(&self, style: &str) -> StorageResult<StoredFile> {
        self.to_file(style).await
    }

    /// Queues `local` to be written as `style` on the next flush.
    pub fn queue_write(&mut self, style: impl Into<String>, local: impl Into<PathBuf>) {
        self.queue.queue_write(style, local);
    }

    /// Queues the stored object of each style for deletion.
    pub fn queue_for_delete<I, S>(&mut self, styles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for style in styles {
            let path = self.path(style.as_ref());
            self.queue.queue_delete(path);
        }
    }

    pub fn queue_delete_path(&mut self, path: impl Into<String>) {
        self.queue.queue_delete(path);
    }

    /// Uploads every pending write.
    ///
    /// The pending writes are cleared up front. Upload failures never make
    /// this return `Err`; they are listed in the report. Only failing to
    /// resolve the container does.
    pub async fn flush_writes(&mut self) -> StorageResult<FlushReport> {
        let writes = self.queue.take_writes();
        if writes.is_empty() {
            return Ok(FlushReport::default());
        }

        let container = self.container().await?;
        let policy = self.backend.retry_policy();
        let mut report = FlushReport::default();

        for (style, local) in &writes {
            let path = self.path(style);
            let options = PutOptions {
                content_type: content_type_for(&path),
                verify_checksum: self.backend.options.verify_checksum,
            };
            let job = WriteJob {
                style,
                path: &path,
                local_path: local,
                options: &options,
            };
            write_with_retry(self.backend.store.as_ref(), &container, job, policy, &mut report)
                .await;
        }

        if report.is_complete() {
            info!("flushed {} write(s) to {}", report.persisted.len(), container.name);
        } else {
            warn!(
                "flushed {} write(s) to {}, dropped {}: {:?}",
                report.persisted.len(),
                container.name,
                report.failed.len(),
                report.failed_styles()
            );
        }
        Ok(report)
    }

    /// Deletes every pending path in queue order.
    ///
    /// The first failure is returned and the remaining paths are dropped
    /// without being issued. Returns the number of objects deleted.
    pub async fn flush_deletes(&mut self) -> StorageResult<usize> {
        let deletes = self.queue.take_deletes();
        if deletes.is_empty() {
            return Ok(0);
        }

        let container = self.container().await?;
        for (i, path) in deletes.iter().enumerate() {
            if let Err(e) = self.backend.store.delete_object(&container, path).await {
                warn!(
                    "delete of {path} failed, {} queued delete(s) dropped: {e}",
                    deletes.len() - i - 1
                );
                return Err(e.into());
            }
        }

        info!("deleted {} object(s) from {}", deletes.len(), container.name);
        Ok(deletes.len())
    }

    /// Flushes writes, then deletes.
    pub async fn flush(&mut self) -> StorageResult<FlushReport> {
        let report = self.flush_writes().await?;
        self.flush_deletes().await?;
        Ok(report)
    }
}
