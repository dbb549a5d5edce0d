//! Attachment storage configuration.

use crate::attachment::Attachment;
use crate::credentials::Credentials;
use crate::error::{StorageError, StorageResult};
use crate::template::{DEFAULT_PATH_TEMPLATE, normalize_url_template};
use cloudfiles_client::{ClientConfig, DEFAULT_AUTH_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Options handed to the Cloud Files client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Identity endpoint. Falls back to the credentials' `auth_url`, then
    /// the Rackspace default.
    pub auth_url: Option<String>,

    /// Storage region. Falls back to the credentials' `region`.
    pub region: Option<String>,

    pub request_timeout_secs: u64,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            auth_url: None,
            region: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Configuration for attachment storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Object path template. `None` uses `:attachment/:id/:style/:basename.:extension`.
    pub path: Option<String>,

    /// URL template. Anything other than a `:cf...url` template is replaced
    /// by `:cf_path_url`.
    pub url: Option<String>,

    /// Environment whose section of the credentials file applies.
    pub environment: Option<String>,

    /// Upload attempts per style before giving up.
    pub max_attempts: u32,

    /// Pause between upload attempts, in milliseconds.
    pub retry_delay_ms: u64,

    /// Ask the service to verify each upload against its MD5.
    pub verify_checksum: bool,

    pub backend: BackendOptions,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            environment: None,
            max_attempts: 3,
            retry_delay_ms: 0,
            verify_checksum: true,
            backend: BackendOptions::default(),
        }
    }
}

impl StorageOptions {
    pub fn from_yaml_str(text: &str) -> StorageResult<Self> {
        let options: Self = serde_yaml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.max_attempts == 0 {
            return Err(StorageError::Config("max_attempts must be at least 1".into()));
        }
        if matches!(self.path.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(StorageError::Config("path template is empty".into()));
        }
        Ok(())
    }

    pub fn path_template(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_PATH_TEMPLATE)
    }

    pub fn url_template(&self) -> String {
        normalize_url_template(self.url.as_deref())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Client settings for `credentials`. Explicit backend options win.
    pub fn client_config(&self, credentials: &Credentials) -> ClientConfig {
        let auth_url = self
            .backend
            .auth_url
            .clone()
            .or_else(|| credentials.auth_url.clone())
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());

        ClientConfig {
            username: credentials.username.clone(),
            api_key: credentials.api_key.clone(),
            servicenet: credentials.servicenet,
            auth_url,
            region: self
                .backend
                .region
                .clone()
                .or_else(|| credentials.region.clone()),
            request_timeout_secs: self.backend.request_timeout_secs,
        }
    }
}

/// Computes a container name from the attachment it is asked for.
pub type ContainerResolver = Arc<dyn Fn(&Attachment) -> String + Send + Sync>;

/// Name of the container attachments live in.
#[derive(Clone)]
pub enum ContainerName {
    Literal(String),
    Resolver(ContainerResolver),
}

impl ContainerName {
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&Attachment) -> String + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    pub fn for_attachment(&self, attachment: &Attachment) -> String {
        match self {
            Self::Literal(name) => name.clone(),
            Self::Resolver(f) => f(attachment),
        }
    }
}

impl From<&str> for ContainerName {
    fn from(name: &str) -> Self {
        Self::Literal(name.to_string())
    }
}

impl From<String> for ContainerName {
    fn from(name: String) -> Self {
        Self::Literal(name)
    }
}

impl fmt::Debug for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}
