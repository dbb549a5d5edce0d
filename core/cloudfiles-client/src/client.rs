//! HTTP client for Rackspace Cloud Files.
//!
//! Authenticates against the identity v2.0 API with an API key, then talks
//! to the Swift storage and CDN management endpoints from the service
//! catalog. Uploads stream from disk and never hold a whole file in memory.

use crate::error::{RemoteError, RemoteResult};
use crate::store::ObjectStore;
use crate::types::{ClientConfig, Container, PutOptions};
use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Client, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const CDN_ENABLED_HEADER: &str = "X-CDN-Enabled";
const CDN_URI_HEADER: &str = "X-Cdn-Uri";
const CDN_SSL_URI_HEADER: &str = "X-Cdn-Ssl-Uri";

const STORAGE_SERVICE: &str = "cloudFiles";
const CDN_SERVICE: &str = "cloudFilesCDN";

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// One authenticated session. Replaced wholesale on reconnect.
struct Session {
    http: Client,
    token: String,
    storage_url: String,
    cdn_url: Option<String>,
}

#[derive(Deserialize)]
struct AuthResponse {
    access: Access,
}

#[derive(Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct Token {
    id: String,
}

#[derive(Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Deserialize)]
struct Endpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL", default)]
    public_url: Option<String>,
    #[serde(rename = "internalURL", default)]
    internal_url: Option<String>,
}

/// Cloud Files implementation of [`ObjectStore`].
///
/// The first call authenticates lazily; [`ObjectStore::connect`] forces a
/// brand new session including a new HTTP connection pool.
pub struct CloudFilesClient {
    config: ClientConfig,
    session: RwLock<Option<Arc<Session>>>,
}

impl CloudFilesClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Storage endpoint of the current session, if any.
    pub async fn storage_url(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.storage_url.clone())
    }

    /// Drops the current session. The next call re-authenticates.
    pub async fn disconnect(&self) {
        *self.session.write().await = None;
    }

    fn build_http(&self) -> RemoteResult<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()
            .map_err(|e| RemoteError::Connection(format!("failed to build HTTP client: {e}")))
    }

    async fn authenticate(&self) -> RemoteResult<Session> {
        let http = self.build_http()?;
        let url = format!("{}/tokens", self.config.auth_url.trim_end_matches('/'));

        let resp = http
            .post(&url)
            .json(&serde_json::json!({
                "auth": {
                    "RAX-KSKEY:apiKeyCredentials": {
                        "username": self.config.username,
                        "apiKey": self.config.api_key,
                    }
                }
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::AuthFailed(format!(
                "identity service rejected {} ({status})",
                self.config.username
            )));
        }
        if !status.is_success() {
            return Err(RemoteError::InvalidResponse {
                status: status.as_u16(),
                context: "authentication".to_string(),
            });
        }

        let auth: AuthResponse = resp.json().await?;
        let region = self.config.region.as_deref();

        let storage_url = pick_endpoint(
            &auth.access.service_catalog,
            STORAGE_SERVICE,
            region,
            self.config.servicenet,
        )
        .ok_or_else(|| {
            RemoteError::AuthFailed(format!("service catalog has no {STORAGE_SERVICE} endpoint"))
        })?;
        // CDN management is only ever reached over the public network
        let cdn_url = pick_endpoint(&auth.access.service_catalog, CDN_SERVICE, region, false);

        debug!(
            "authenticated {} against {} (servicenet: {})",
            self.config.username, storage_url, self.config.servicenet
        );

        Ok(Session {
            http,
            token: auth.access.token.id,
            storage_url,
            cdn_url,
        })
    }

    async fn establish(&self) -> RemoteResult<Arc<Session>> {
        let session = Arc::new(self.authenticate().await?);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Returns the live session, authenticating if there is none.
    async fn session(&self) -> RemoteResult<Arc<Session>> {
        {
            let session = self.session.read().await;
            if let Some(ref s) = *session {
                return Ok(s.clone());
            }
        }
        self.establish().await
    }
}

#[async_trait]
impl ObjectStore for CloudFilesClient {
    async fn connect(&self) -> RemoteResult<()> {
        // A failed reconnect must not leave the previous session usable
        self.disconnect().await;
        self.establish().await?;
        info!("opened new Cloud Files session for {}", self.config.username);
        Ok(())
    }

    async fn create_container(&self, name: &str) -> RemoteResult<Container> {
        let session = self.session().await?;
        let url = container_url(&session.storage_url, name);

        let resp = session
            .http
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .header(CONTENT_LENGTH, 0)
            .send()
            .await?;
        check(resp, &format!("create container {name}"))?;

        debug!("container {name} ready");
        Ok(Container::new(name))
    }

    async fn make_public(&self, container: &Container) -> RemoteResult<Container> {
        let session = self.session().await?;
        let cdn_url = session
            .cdn_url
            .as_deref()
            .ok_or_else(|| RemoteError::NotFound(format!("{CDN_SERVICE} endpoint")))?;
        let url = container_url(cdn_url, &container.name);

        let resp = session
            .http
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .header(CDN_ENABLED_HEADER, "True")
            .header(CONTENT_LENGTH, 0)
            .send()
            .await?;
        let resp = check(resp, &format!("publish container {}", container.name))?;

        let headers = resp.headers();
        let cdn_uri = headers
            .get(CDN_URI_HEADER)
            .or_else(|| headers.get(CDN_SSL_URI_HEADER))
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                RemoteError::Decode(format!(
                    "CDN response for {} has no {CDN_URI_HEADER}",
                    container.name
                ))
            })?;

        debug!("container {} published at {cdn_uri}", container.name);
        Ok(container.clone().with_cdn_base_url(cdn_uri))
    }

    async fn object_exists(&self, container: &Container, path: &str) -> RemoteResult<bool> {
        let session = self.session().await?;
        let url = object_url(&session.storage_url, &container.name, path);

        let resp = session
            .http
            .head(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(resp, &format!("head {path}"))?;
        Ok(true)
    }

    async fn put_file(
        &self,
        container: &Container,
        path: &str,
        local_path: &Path,
        options: &PutOptions,
    ) -> RemoteResult<()> {
        let session = self.session().await?;
        let url = object_url(&session.storage_url, &container.name, path);
        let size = tokio::fs::metadata(local_path).await?.len();

        let mut request = session
            .http
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .header(CONTENT_LENGTH, size);
        if let Some(ref content_type) = options.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if options.verify_checksum {
            request = request.header(ETAG, file_md5(local_path).await?);
        }

        let file = tokio::fs::File::open(local_path).await?;
        let resp = request
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        check(resp, &format!("upload {path}"))?;

        debug!("uploaded {size} bytes to {}/{path}", container.name);
        Ok(())
    }

    async fn get_object(&self, container: &Container, path: &str) -> RemoteResult<Vec<u8>> {
        let session = self.session().await?;
        let url = object_url(&session.storage_url, &container.name, path);

        let resp = session
            .http
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;
        let body = check(resp, &format!("download {path}"))?.bytes().await?;

        debug!("downloaded {} bytes from {}/{path}", body.len(), container.name);
        Ok(body.to_vec())
    }

    async fn download_object(
        &self,
        container: &Container,
        path: &str,
        dest: &Path,
    ) -> RemoteResult<u64> {
        let session = self.session().await?;
        let url = object_url(&session.storage_url, &container.name, path);

        let resp = session
            .http
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;
        let mut resp = check(resp, &format!("download {path}"))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let streamed: RemoteResult<u64> = async {
            let mut written = 0u64;
            while let Some(chunk) = resp.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(written)
        }
        .await;
        let written = match streamed {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!("could not remove partial download {}: {rm}", dest.display());
                }
                return Err(e);
            }
        };

        debug!("streamed {written} bytes from {}/{path} to {}", container.name, dest.display());
        Ok(written)
    }

    async fn delete_object(&self, container: &Container, path: &str) -> RemoteResult<()> {
        let session = self.session().await?;
        let url = object_url(&session.storage_url, &container.name, path);

        let resp = session
            .http
            .delete(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;
        check(resp, &format!("delete {path}"))?;

        debug!("deleted {}/{path}", container.name);
        Ok(())
    }
}

/// Maps a non-2xx response onto the error taxonomy.
fn check(resp: Response, context: &str) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(RemoteError::Unauthorized(context.to_string())),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(context.to_string())),
        _ => Err(RemoteError::InvalidResponse {
            status: status.as_u16(),
            context: context.to_string(),
        }),
    }
}

fn pick_endpoint(
    catalog: &[CatalogEntry],
    service: &str,
    region: Option<&str>,
    internal: bool,
) -> Option<String> {
    let entry = catalog.iter().find(|e| e.name == service)?;
    let endpoint = entry.endpoints.iter().find(|ep| match (region, &ep.region) {
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        (Some(_), None) => false,
        (None, _) => true,
    })?;
    let url = if internal {
        endpoint.internal_url.as_ref()
    } else {
        endpoint.public_url.as_ref()
    };
    url.map(|u| u.trim_end_matches('/').to_string())
}

fn container_url(base: &str, container: &str) -> String {
    format!("{base}/{}", urlencoding::encode(container))
}

fn object_url(base: &str, container: &str, path: &str) -> String {
    format!("{}/{}", container_url(base, container), encode_path(path))
}

/// Percent-encodes each segment of an object path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hex MD5 of a file, read in chunks.
async fn file_md5(path: &Path) -> RemoteResult<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
