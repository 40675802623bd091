//! Loading a [`ClientConfig`] from TOML and the environment.
//!
//! File resolution order:
//! 1. explicit path (must exist)
//! 2. `$LECTERN_CONFIG`
//! 3. `<config_dir>/lectern/config.toml` (e.g. `~/.config/lectern/config.toml`)
//!
//! No file at all is not an error; the defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ClientConfig;
use crate::{LecternError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LECTERN_CONFIG";
/// Environment variable overriding the access token.
pub const ENV_ACCESS_TOKEN: &str = "LECTERN_ACCESS_TOKEN";
/// Environment variable overriding the host.
pub const ENV_HOST: &str = "LECTERN_HOST";

impl ClientConfig {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LecternError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Read and parse one TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(?path, "loading client config");
        let content = fs::read_to_string(path).map_err(|e| {
            LecternError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            LecternError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Overlay `LECTERN_ACCESS_TOKEN` / `LECTERN_HOST` from the process
    /// environment. Environment values win over the file.
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Overlay environment values read through `lookup`.
    pub fn with_env_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = ClientConfig {
            access_token: lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()),
            host: lookup(ENV_HOST).filter(|v| !v.is_empty()),
            ..Default::default()
        };
        env.or(&self)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(LecternError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(LecternError::Configuration(format!(
                "{CONFIG_ENV_VAR} points at a missing file: {path:?}"
            )));
        }

        Ok(dirs::config_dir()
            .map(|dir| dir.join("lectern").join("config.toml"))
            .filter(|path| path.exists()))
    }
}
