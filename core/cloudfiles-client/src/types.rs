//! Shared types for object store operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity endpoint used when no `auth_url` is configured.
pub const DEFAULT_AUTH_URL: &str = "https://identity.api.rackspacecloud.com/v2.0";

/// Default per-request timeout handed to the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A remote container.
///
/// `cdn_base_url` is only known once the container has been CDN-enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub cdn_base_url: Option<String>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cdn_base_url: None,
        }
    }

    pub fn with_cdn_base_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_base_url = Some(url.into());
        self
    }

    pub fn cdn_base_url(&self) -> Option<&str> {
        self.cdn_base_url.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.cdn_base_url.is_some()
    }
}

/// Per-upload options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Sent as `Content-Type` when present; omitted otherwise.
    pub content_type: Option<String>,
    /// Send the file's MD5 as `ETag` so the service rejects corrupted uploads.
    pub verify_checksum: bool,
}

/// Connection settings for [`crate::CloudFilesClient`].
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub username: String,
    pub api_key: String,

    /// Use the internal (ServiceNet) storage endpoint instead of the public one.
    #[serde(default)]
    pub servicenet: bool,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Region to pick from the service catalog. First endpoint when unset.
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            servicenet: false,
            auth_url: default_auth_url(),
            region: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("servicenet", &self.servicenet)
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
