//! Credential resolution.
//!
//! Credentials come from a YAML file, any reader producing YAML, or an
//! already-parsed mapping. The document is either the credential record
//! itself or a map of environment name to record:
//!
//! ```yaml
//! production:
//!   username: acme
//!   api_key: 0123abcd
//!   servicenet: true
//! development:
//!   username: acme-dev
//!   api_key: 4567efgh
//! ```

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Where credentials are read from.
pub enum CredentialSource {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
    Inline(Mapping),
}

impl CredentialSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    pub fn inline(mapping: Mapping) -> Self {
        Self::Inline(mapping)
    }

    /// Parses the source and selects the record for `environment`.
    ///
    /// The environment sub-map is used only when it exists and is itself a
    /// mapping; otherwise the whole document is the record.
    pub fn resolve(self, environment: Option<&str>) -> StorageResult<Credentials> {
        let document = match self {
            Self::Path(path) => {
                let text = std::fs::read_to_string(&path).map_err(|e| {
                    StorageError::Config(format!(
                        "cannot read credentials file {}: {e}",
                        path.display()
                    ))
                })?;
                serde_yaml::from_str(&text)?
            }
            Self::Reader(reader) => serde_yaml::from_reader(reader)?,
            Self::Inline(mapping) => Value::Mapping(mapping),
        };

        let Value::Mapping(mapping) = document else {
            return Err(StorageError::Config(format!(
                "credentials must be a mapping, got {}",
                describe(&document)
            )));
        };
        let mapping = normalize_keys(mapping);

        let scoped = environment.and_then(|env| match mapping.get(env) {
            Some(Value::Mapping(scoped)) => Some(scoped.clone()),
            _ => None,
        });
        let record = match scoped {
            Some(scoped) => normalize_keys(scoped),
            None => mapping,
        };

        let credentials: Credentials = serde_yaml::from_value(Value::Mapping(record))
            .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;
        credentials.validate()?;
        Ok(credentials)
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// Account credentials plus the optional settings a credentials file may carry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub api_key: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub servicenet: bool,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Credentials {
    fn validate(&self) -> StorageResult<()> {
        if self.username.trim().is_empty() {
            return Err(StorageError::Config("credentials have an empty username".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(StorageError::Config("credentials have an empty api_key".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("servicenet", &self.servicenet)
            .field("container", &self.container)
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .finish()
    }
}

/// Strips a leading `:` from string keys so `:username` reads as `username`.
fn normalize_keys(mapping: Mapping) -> Mapping {
    mapping
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(s) => (Value::String(s.trim_start_matches(':').to_string()), value),
            other => (other, value),
        })
        .collect()
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Accepts `true`/`false` as booleans or strings.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "servicenet must be a boolean, got {}",
            describe(&other)
        ))),
    }
}

/// Accepts strings and unquoted integers, so `api_key: 1234567890` reads
/// as the string it was meant to be.
///
/// Floats are rejected: `1e10` or `1.50` cannot be turned back into the
/// text that was written.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::Number(n) => Err(serde::de::Error::custom(format!(
            "{n} was read as a float, quote it to keep it as written"
        ))),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, got {}",
            describe(&other)
        ))),
    }
}
