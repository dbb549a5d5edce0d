//! Scripted in-memory object store for adapter tests.
#![allow(dead_code)]

use async_trait::async_trait;
use cloudfiles_client::{Container, ObjectStore, PutOptions, RemoteError, RemoteResult};
use cloudfiles_storage::{Attachment, ContainerName, StorageBackend, StorageOptions};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

pub const CDN_BASE: &str = "http://c0.r0.cf1.rackcdn.com";

/// Calls observed by the mock, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Connect,
    CreateContainer(String),
    MakePublic(String),
    Exists(String),
    Put {
        path: String,
        content_type: Option<String>,
        verify_checksum: bool,
    },
    Get(String),
    Delete(String),
}

#[derive(Default)]
pub struct MockStore {
    calls: Mutex<Vec<Call>>,
    /// Results for put_file, in order. Empty means success.
    put_results: Mutex<VecDeque<RemoteResult<()>>>,
    /// Results for delete_object, in order. Empty means success.
    delete_results: Mutex<VecDeque<RemoteResult<()>>>,
    /// Results for connect, in order. Empty means success.
    connect_results: Mutex<VecDeque<RemoteResult<()>>>,
    create_error: Mutex<Option<RemoteError>>,
    /// create_container for this name waits until the gate is notified.
    create_gate: Mutex<Option<(String, Arc<Notify>)>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn script_puts(&self, results: Vec<RemoteResult<()>>) {
        self.put_results.lock().await.extend(results);
    }

    pub async fn script_deletes(&self, results: Vec<RemoteResult<()>>) {
        self.delete_results.lock().await.extend(results);
    }

    pub async fn script_connects(&self, results: Vec<RemoteResult<()>>) {
        self.connect_results.lock().await.extend(results);
    }

    /// Holds creation of `name` until the returned gate is notified.
    pub async fn hold_create(&self, name: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().await = Some((name.to_string(), gate.clone()));
        gate
    }

    pub async fn fail_create(&self, error: RemoteError) {
        *self.create_error.lock().await = Some(error);
    }

    pub async fn insert_object(&self, path: &str, body: &[u8]) {
        self.objects
            .lock()
            .await
            .insert(path.to_string(), body.to_vec());
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|c| matches(c)).count()
    }

    pub async fn puts(&self) -> Vec<Call> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| matches!(c, Call::Put { .. }))
            .cloned()
            .collect()
    }

    pub async fn deletes(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                Call::Delete(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn connect(&self) -> RemoteResult<()> {
        self.record(Call::Connect).await;
        self.connect_results.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn create_container(&self, name: &str) -> RemoteResult<Container> {
        self.record(Call::CreateContainer(name.to_string())).await;
        let gate = match &*self.create_gate.lock().await {
            Some((held, gate)) if held == name => Some(gate.clone()),
            _ => None,
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.create_error.lock().await.take() {
            return Err(err);
        }
        Ok(Container::new(name))
    }

    async fn make_public(&self, container: &Container) -> RemoteResult<Container> {
        self.record(Call::MakePublic(container.name.clone())).await;
        Ok(container.clone().with_cdn_base_url(CDN_BASE))
    }

    async fn object_exists(&self, _container: &Container, path: &str) -> RemoteResult<bool> {
        self.record(Call::Exists(path.to_string())).await;
        Ok(self.objects.lock().await.contains_key(path))
    }

    async fn put_file(
        &self,
        _container: &Container,
        path: &str,
        local_path: &Path,
        options: &PutOptions,
    ) -> RemoteResult<()> {
        self.record(Call::Put {
            path: path.to_string(),
            content_type: options.content_type.clone(),
            verify_checksum: options.verify_checksum,
        })
        .await;
        if let Some(result) = self.put_results.lock().await.pop_front() {
            result?;
        }
        let body = tokio::fs::read(local_path).await?;
        self.objects.lock().await.insert(path.to_string(), body);
        Ok(())
    }

    async fn get_object(&self, _container: &Container, path: &str) -> RemoteResult<Vec<u8>> {
        self.record(Call::Get(path.to_string())).await;
        self.objects
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn delete_object(&self, _container: &Container, path: &str) -> RemoteResult<()> {
        self.record(Call::Delete(path.to_string())).await;
        if let Some(result) = self.delete_results.lock().await.pop_front() {
            result?;
        }
        self.objects.lock().await.remove(path);
        Ok(())
    }
}

pub fn connection_reset() -> RemoteError {
    RemoteError::Connection("connection reset by peer".into())
}

pub fn invalid_response() -> RemoteError {
    RemoteError::InvalidResponse {
        status: 502,
        context: "upload".into(),
    }
}

pub fn attachment() -> Attachment {
    Attachment::new("users", "avatars", 42).with_original_filename("me.png")
}

pub fn backend(store: &Arc<MockStore>) -> Arc<StorageBackend> {
    backend_with(store, StorageOptions::default())
}

pub fn backend_with(store: &Arc<MockStore>, options: StorageOptions) -> Arc<StorageBackend> {
    let store: Arc<dyn ObjectStore> = store.clone();
    Arc::new(StorageBackend::new(store, ContainerName::from("assets"), options).unwrap())
}

/// Writes `body` to a fresh temp file named `name`.
pub fn local_file(dir: &tempfile::TempDir, name: &str, body: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}
