use clap::Parser;
use resx::cli::{run_cli, Cli, Commands};
use resx::logging::{init_logging_with_config, LogConfig};
use resx::runtime_config::RuntimeConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // listing commands print JSON on stdout; keep it clean
    let _log_guard = match cli.command {
        Commands::Serve { .. } => Some(init_logging_with_config(&LogConfig::from_env())?),
        _ => None,
    };
    RuntimeConfig::from_env().apply();
    run_cli(cli)
}
