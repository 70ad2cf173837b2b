//! # FieldGuard Server
//!
//! HTTP front for the PII protection slice, built on `Axum`, an in-memory document store
//! and a typed event bus. Every user record written through the store is encrypted at
//! rest by the background write guard; `POST /rpc/decrypt-user` is the only way back to
//! plaintext.
//!
//! ## Example
//! ```no_run
//! use fieldguard_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(8080)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use fieldguard_database::MemoryStore;
use fieldguard_event_bus::EventBus;
use fieldguard_kernel::domain::config::{ApiConfig, LoggingConfig, SecurityConfig};
use fieldguard_kernel::server::ApiState;
use fieldguard_logger::{Logger, parse_level};
use fieldguard_vault::{EnvKeyProvider, HexKeyProvider, KeyProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
    keys: Option<Arc<dyn KeyProvider>>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("cfg", &self.cfg)
            .field("keys", &self.keys.is_some())
            .finish()
    }
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Overrides the key provider derived from `security` settings.
    pub fn keys(mut self, keys: Arc<dyn KeyProvider>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Resolves the key provider and validates the key once
    /// 2. Creates the event bus and document store
    /// 3. Constructs application state
    /// 4. Starts the write guard on the store's change events
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if:
    /// * The encryption key is missing or is not 64 hex characters
    /// * The application state cannot be assembled
    pub fn build(self) -> Result<Server> {
        let keys = self.keys.unwrap_or_else(|| key_provider(&self.cfg.security));
        keys.key().context("Encryption key rejected at startup")?;
        info!("Encryption key loaded");

        if self.cfg.security.api_token.as_deref().is_none_or(str::is_empty) {
            warn!("SECURITY: no API token configured; decrypt RPC is open to any caller");
        }

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, collection = %self.cfg.database.collection, "Initializing server");

        let events = EventBus::new();
        let store = MemoryStore::new(events.clone());

        let state = ApiState::builder()
            .config(self.cfg)
            .store(store)
            .events(events)
            .keys(keys)
            .build()
            .context("Failed to finalize API state")?;

        let guard = fieldguard_protection::init(&state).context("Failed to start write guard")?;

        Ok(Server { state, guard })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
    guard: JoinHandle<()>,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// On shutdown the event bus is closed and the write guard drains before returning.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        info!("Starting HTTP server on http://{address}");

        axum_server::bind(address)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTP server failed")?;

        let closed = self.state.events.shutdown();
        info!(channels = closed, "Event bus closed, waiting for write guard");
        if let Err(e) = self.guard.await {
            error!("Write guard task failed: {e}");
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Builds the HTTP router over this server's state.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Installs the global tracing subscriber from the `logging` section.
///
/// # Errors
/// Returns an error for an unknown level, an invalid filter, an unusable log directory,
/// or if a subscriber is already installed.
pub fn init_logger(cfg: &LoggingConfig) -> Result<Logger> {
    let level = parse_level(&cfg.level)?;
    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    let builder = match &cfg.filter {
        Some(filter) => builder.env_filter(filter),
        None => builder,
    };

    let logger = match &cfg.path {
        Some(path) => builder.path(path).json(cfg.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

/// Key from `security.encryption_key` if set, otherwise from the `security.key_env` variable.
fn key_provider(security: &SecurityConfig) -> Arc<dyn KeyProvider> {
    match &security.encryption_key {
        Some(encoded) => Arc::new(HexKeyProvider::new(encoded.as_str())),
        None => Arc::new(EnvKeyProvider::new(security.key_env.clone())),
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
