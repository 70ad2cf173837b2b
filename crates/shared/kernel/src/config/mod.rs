use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix for environment overrides (`FIELDGUARD__SECTION__KEY`).
pub const ENV_PREFIX: &str = "FIELDGUARD";

/// Base name of the default configuration file (`server.toml`, `server.json`, ...).
pub const DEFAULT_CONFIG_FILE: &str = "server";

/// Custom error type for config loading.
#[fieldguard_derive::fieldguard_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from a file layered with environment overrides.
///
/// 1. **Base File**: `path` if given (must exist), otherwise `server.*` in the working
///    directory if present.
/// 2. **Environment Overrides**: variables prefixed with `FIELDGUARD__`, nested with `__`
///    (e.g. `FIELDGUARD__SECURITY__ENCRYPTION_KEY` maps to `security.encryption_key`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing or unreadable, or if the
/// merged values do not match `T`.
///
/// # Example
/// ```rust
/// use fieldguard_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
