//! Structured logging setup
//!
//! All engine logs go through `tracing`. [`init_logging_with_config`]
//! installs the global subscriber once at startup:
//!
//! - JSON lines (default) or a pretty multi-line format for local work
//! - `EnvFilter` with `RUST_LOG` taking precedence over `RESX_LOG_LEVEL`
//! - output to stdout, or to a daily rolling file under `RESX_LOG_DIR`
//! - optional non-blocking writer so request coroutines never wait on I/O
//!
//! Secret parameter values never reach a log field; callers log
//! [`crate::params::redacted`] views instead of raw parameter maps.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name prefix of rolled log files.
const LOG_FILE_PREFIX: &str = "resx.log";

/// Directives always added to the filter. Client disconnects are reported by
/// the HTTP layer at debug/info and are noise at our default level.
const QUIET_TARGETS: &[&str] = &["may_minihttp::http_server=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `pretty` (any case) selects [`LogFormat::Pretty`], anything else JSON.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("pretty") {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error, used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Hand records to a background writer thread
    pub async_output: bool,
    /// Extra comma-separated `target=level` directives
    pub target_filter: Option<String>,
    pub include_location: bool,
    /// Daily rolling files in this directory instead of stdout
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            async_output: true,
            target_filter: None,
            include_location: false,
            log_dir: None,
        }
    }
}

impl LogConfig {
    /// Read the `RESX_LOG_*` variables on top of [`LogConfig::default`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str| {
            lookup(key).map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
        };
        Self {
            level: lookup("RESX_LOG_LEVEL").unwrap_or(defaults.level),
            format: lookup("RESX_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_output: flag("RESX_LOG_ASYNC").unwrap_or(defaults.async_output),
            target_filter: lookup("RESX_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: flag("RESX_LOG_INCLUDE_LOCATION").unwrap_or(defaults.include_location),
            log_dir: lookup("RESX_LOG_DIR").map(PathBuf::from),
        }
    }

    /// Pretty, synchronous, debug level with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_output: false,
            include_location: true,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let extra = self
            .target_filter
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty());
        for directive in QUIET_TARGETS.iter().copied().chain(extra) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                // no subscriber yet, so stderr is the only place to say it
                Err(e) => eprintln!("Ignoring log filter directive '{directive}': {e}"),
            }
        }
        filter
    }
}

/// Keeps the background log writer alive. Dropping it flushes pending records.
#[must_use = "dropping the guard stops asynchronous log output"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer);
    match config.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the log directory
/// cannot be created.
///
/// ```no_run
/// use resx::logging::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env()).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<LogGuard> {
    let registry = tracing_subscriber::registry().with(config.filter());

    let guard = match (&config.log_dir, config.async_output) {
        (Some(dir), _) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            // files always go through the background writer
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            registry.with(fmt_layer(config, writer)).try_init()?;
            Some(guard)
        }
        (None, true) => {
            let (writer, guard) = tracing_appender::non_blocking(io::stdout());
            registry.with(fmt_layer(config, writer)).try_init()?;
            Some(guard)
        }
        (None, false) => {
            registry.with(fmt_layer(config, io::stdout)).try_init()?;
            None
        }
    };
    Ok(LogGuard { _worker: guard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> LogConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse(" PRETTY "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(config_from(&[]), LogConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = config_from(&[
            ("RESX_LOG_LEVEL", "debug"),
            ("RESX_LOG_FORMAT", "pretty"),
            ("RESX_LOG_ASYNC", "off"),
            ("RESX_LOG_TARGET_FILTER", "  "),
            ("RESX_LOG_INCLUDE_LOCATION", "yes"),
            ("RESX_LOG_DIR", "/var/log/resx"),
        ]);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.async_output);
        assert_eq!(config.target_filter, None);
        assert!(config.include_location);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/resx")));
    }

    #[test]
    fn test_development_profile() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.async_output);
        assert!(config.include_location);
        assert_eq!(config.log_dir, None);
    }
}
