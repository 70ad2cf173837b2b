//! Kernel utilities shared across slices.
//! Keep this crate lightweight; it holds config loading, request id checks and, behind the
//! `server` feature, the shared HTTP state and system routes.
//!
//! ## Config loading
//! ```rust,no_run
//! use fieldguard_kernel::config::load_config;
//! use fieldguard_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("server.toml")).unwrap();
//! ```
pub mod config;
pub mod security;
#[cfg(feature = "server")]
pub mod server;

pub use fieldguard_domain as domain;
