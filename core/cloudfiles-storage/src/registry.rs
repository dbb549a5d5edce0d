//! Container resolution with a per-backend cache.
//!
//! Each container is created and made public once, the first time it is
//! asked for, then served from the cache for the registry's lifetime.

use crate::error::{StorageError, StorageResult};
use cloudfiles_client::{Container, ObjectStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

type Slot = Arc<OnceCell<Arc<Container>>>;

/// Resolves container names to public container handles.
///
/// Each name has its own slot, so a slow first resolution only holds up
/// callers asking for that same name.
pub struct ContainerRegistry {
    store: Arc<dyn ObjectStore>,
    containers: RwLock<HashMap<String, Slot>>,
}

impl ContainerRegistry {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            containers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the public container called `name`, creating it if needed.
    ///
    /// The make-public call runs on first resolution even when the container
    /// already existed remotely. Failures are not cached.
    pub async fn resolve(&self, name: &str) -> StorageResult<Arc<Container>> {
        let slot = self.slot(name).await;
        if let Some(container) = slot.get() {
            return Ok(container.clone());
        }

        debug!("resolving container {name}");
        let container = slot
            .get_or_try_init(|| async {
                let created = self.store.create_container(name).await?;
                let public = self.store.make_public(&created).await?;
                info!(
                    "container {name} ready at {}",
                    public.cdn_base_url().unwrap_or("<no cdn>")
                );
                Ok::<_, StorageError>(Arc::new(public))
            })
            .await?;
        Ok(container.clone())
    }

    /// Returns the slot for `name`, inserting an empty one on first use.
    ///
    /// The map lock is held only for the lookup, never across remote calls.
    async fn slot(&self, name: &str) -> Slot {
        {
            let containers = self.containers.read().await;
            if let Some(slot) = containers.get(name) {
                return slot.clone();
            }
        }

        self.containers
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Returns the cached handle without touching the store.
    pub async fn cached(&self, name: &str) -> Option<Arc<Container>> {
        self.containers
            .read()
            .await
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of containers resolved so far.
    pub async fn len(&self) -> usize {
        self.containers
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
