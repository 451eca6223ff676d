//! # CLI
//!
//! ```bash
//! # serve with defaults (0.0.0.0:8001, ./resourceDB)
//! resx serve
//!
//! # configuration file plus overrides
//! resx serve --config resx.yaml --addr 127.0.0.1:9000 --static-dir ./static
//!
//! # inspect
//! resx components
//! resx resources --partial --storage ./resourceDB
//! ```
//!
//! `serve` stops cleanly on SIGINT or SIGTERM.

mod commands;


pub use commands::{
    components_listing, resolve_config, resources_listing, run_cli, start_server, Cli, Commands,
};
