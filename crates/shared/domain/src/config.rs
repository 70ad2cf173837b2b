use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

use crate::fields::USERS;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub guard: GuardConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// Key and API access settings.
///
/// `encryption_key` takes precedence over `key_env` when both are present.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// 64 hex characters; normally supplied via `FIELDGUARD__SECURITY__ENCRYPTION_KEY`.
    pub encryption_key: Option<String>,
    /// Environment variable read when `encryption_key` is unset.
    pub key_env: String,
    /// Bearer token required by the decrypt RPC. Unset disables the check.
    pub api_token: Option<String>,
}

/// Document store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub collection: String,
}

/// Retry policy for the write-path guard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further attempt.
    pub retry_delay_ms: u64,
}

/// Tracing output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Explicit `EnvFilter` directives; overrides `RUST_LOG`.
    pub filter: Option<String>,
    /// Directory for rolling log files. Console only when unset.
    pub path: Option<PathBuf>,
    pub json: bool,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &redact(&self.encryption_key))
            .field("key_env", &self.key_env)
            .field("api_token", &redact(&self.api_token))
            .finish()
    }
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8080 }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { encryption_key: None, key_env: "ENCRYPTION_KEY".to_owned(), api_token: None }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { collection: USERS.to_owned() }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self { max_attempts: 3, retry_delay_ms: 200 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, path: None, json: false }
    }
}
