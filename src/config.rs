//! # Server Configuration
//!
//! Settings for a running engine, loaded from a YAML or TOML file (picked by
//! extension) with a handful of environment overrides on top.
//!
//! ```yaml
//! listen_addr: "0.0.0.0:8001"
//! storage_dir: resourceDB
//! static_dir: static
//! prefixes:
//!   code: /code
//!   resource: /resource
//!   specialized: /specialized
//! unknown_params: ignore        # or: reject
//! name_collision: reject        # or: overwrite
//! max_extension_depth: 16
//! ```
//!
//! ## Environment Variables
//!
//! | Variable             | Overrides      |
//! |----------------------|----------------|
//! | `RESX_LISTEN_ADDR`   | `listen_addr`  |
//! | `RESX_STORAGE_DIR`   | `storage_dir`  |
//! | `RESX_STATIC_DIR`    | `static_dir`   |
//!
//! Logging is configured separately, see [`crate::logging`].

use crate::params::UnknownParamPolicy;
use crate::resources::NameCollision;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// URL prefixes of the engine's top-level areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefixes {
    pub meta: String,
    pub code: String,
    pub resource: String,
    pub specialized: String,
    #[serde(rename = "static")]
    pub static_files: String,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self {
            meta: "/meta".to_string(),
            code: "/code".to_string(),
            resource: "/resource".to_string(),
            specialized: "/specialized".to_string(),
            static_files: "/static".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory of the file-backed resource store
    pub storage_dir: PathBuf,
    /// Static files served under `prefixes.static`; disabled when unset
    pub static_dir: Option<PathBuf>,
    pub prefixes: Prefixes,
    pub unknown_params: UnknownParamPolicy,
    pub name_collision: NameCollision,
    pub max_extension_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8001".to_string(),
            storage_dir: PathBuf::from("resourceDB"),
            static_dir: None,
            prefixes: Prefixes::default(),
            unknown_params: UnknownParamPolicy::default(),
            name_collision: NameCollision::default(),
            max_extension_depth: 16,
        }
    }
}

impl ServerConfig {
    /// Read a config file. `.yaml`/`.yml` and `.toml` are supported.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match ext.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid YAML config {}", path.display()))?,
            Some("toml") => toml::from_str(&text)
                .with_context(|| format!("Invalid TOML config {}", path.display()))?,
            _ => bail!("Unsupported config format: {}", path.display()),
        };
        Ok(config)
    }

    /// Defaults, or the given file, with environment overrides applied.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(addr) = env::var("RESX_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Ok(dir) = env::var("RESX_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("RESX_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resx.yaml");
        fs::write(
            &path,
            "listen_addr: 127.0.0.1:9000\nprefixes:\n  resource: /res\nname_collision: overwrite\n",
        )
        .unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.prefixes.resource, "/res");
        assert_eq!(config.prefixes.code, "/code");
        assert_eq!(config.name_collision, NameCollision::Overwrite);
        assert_eq!(config.max_extension_depth, 16);
    }

    #[test]
    fn test_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resx.toml");
        fs::write(
            &path,
            "storage_dir = \"/var/lib/resx\"\nunknown_params = \"reject\"\n\n[prefixes]\nstatic = \"/assets\"\n",
        )
        .unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/resx"));
        assert_eq!(config.unknown_params, UnknownParamPolicy::Reject);
        assert_eq!(config.prefixes.static_files, "/assets");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resx.ini");
        fs::write(&path, "x=1").unwrap();
        assert!(ServerConfig::load(&path).is_err());
    }
}
