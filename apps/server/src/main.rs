use anyhow::Context;
use fieldguard_kernel::config::load_config;
use fieldguard_kernel::domain::config::ApiConfig;
use fieldguard_server::{Server, init_logger};
use std::path::PathBuf;

/// Overrides the config file location (default `./server.toml`, optional).
const CONFIG_PATH_ENV: &str = "FIELDGUARD_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let cfg: ApiConfig = load_config(path).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg.logging)?;

    Server::builder().config(cfg).build()?.run().await
}
