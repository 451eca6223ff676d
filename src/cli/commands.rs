use crate::component::ComponentRegistry;
use crate::config::ServerConfig;
use crate::resources::ResourceStore;
use crate::server::{AppService, Engine, HttpServer, ServerHandle};
use crate::storage::FileStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface of the resource server
#[derive(Parser)]
#[command(name = "resx", version)]
#[command(about = "Serve registered components as persisted HTTP resources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// YAML or TOML configuration file
        #[arg(short, long, env = "RESX_CONFIG")]
        config: Option<PathBuf>,

        /// Listen address, overrides the configuration
        #[arg(short, long)]
        addr: Option<String>,

        /// Resource storage directory, overrides the configuration
        #[arg(short, long)]
        storage: Option<PathBuf>,

        /// Directory served under the static prefix
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Print the catalog of registered components
    Components {
        #[arg(short, long, env = "RESX_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the stored resources
    Resources {
        /// List partial (specialized) resources instead
        #[arg(long, default_value_t = false)]
        partial: bool,

        #[arg(short, long)]
        storage: Option<PathBuf>,

        #[arg(short, long, env = "RESX_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Configuration file (or defaults) with environment and flag overrides.
pub fn resolve_config(
    config: Option<&PathBuf>,
    addr: Option<&String>,
    storage: Option<&PathBuf>,
    static_dir: Option<&PathBuf>,
) -> Result<ServerConfig> {
    let mut resolved = ServerConfig::resolve(config.map(PathBuf::as_path))?;
    if let Some(addr) = addr {
        resolved.listen_addr.clone_from(addr);
    }
    if let Some(storage) = storage {
        resolved.storage_dir.clone_from(storage);
    }
    if let Some(dir) = static_dir {
        resolved.static_dir = Some(dir.clone());
    }
    Ok(resolved)
}

/// Start serving `config` with the built-in components.
pub fn start_server(config: &ServerConfig) -> Result<ServerHandle> {
    let registry = ComponentRegistry::with_builtins().context("Invalid built-in component")?;
    let engine = Engine::from_config(config, registry).with_context(|| {
        format!("Cannot open resource storage {}", config.storage_dir.display())
    })?;
    let handle = HttpServer(AppService::new(Arc::new(engine)))
        .start(config.listen_addr.as_str())
        .with_context(|| format!("Cannot listen on {}", config.listen_addr))?;
    info!(addr = %handle.addr(), "Server listening");
    Ok(handle)
}

/// Pretty JSON catalog of the built-in components.
pub fn components_listing(config: &ServerConfig) -> Result<String> {
    let registry = ComponentRegistry::with_builtins().context("Invalid built-in component")?;
    let catalog = registry.catalog(&config.prefixes.code);
    Ok(serde_json::to_string_pretty(&catalog)?)
}

/// Pretty JSON listing of the resources stored under `config.storage_dir`.
pub fn resources_listing(config: &ServerConfig, partial: bool) -> Result<String> {
    let blobs = FileStore::open(config.storage_dir.clone())
        .with_context(|| format!("Cannot open resource storage {}", config.storage_dir.display()))?;
    let store = ResourceStore::new(Arc::new(blobs)).with_prefixes(config.prefixes.clone());
    let listing = store.list(partial)?;
    Ok(serde_json::to_string_pretty(&listing)?)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Cannot install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    info!("Server stopped");
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("Server coroutine panicked: {e:?}"))
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Serve {
            config,
            addr,
            storage,
            static_dir,
        } => {
            let config = resolve_config(config.as_ref(), addr.as_ref(), storage.as_ref(), static_dir.as_ref())?;
            let handle = start_server(&config)?;
            wait_for_shutdown(handle)
        }
        Commands::Components { config } => {
            let config = resolve_config(config.as_ref(), None, None, None)?;
            println!("{}", components_listing(&config)?);
            Ok(())
        }
        Commands::Resources {
            partial,
            storage,
            config,
        } => {
            let config = resolve_config(config.as_ref(), None, storage.as_ref(), None)?;
            println!("{}", resources_listing(&config, *partial)?);
            Ok(())
        }
    }
}
