//! Configuration ingestion.
//!
//! The core treats configuration as an opaque pre-parsed registry; this
//! module owns the file format. Servers are an array of tables so the file
//! order survives parsing, because registration order decides domain
//! tie-breaks and the default suggestion domain.
//!
//! ```toml
//! targets = ["alice@example.net"]
//!
//! [[servers]]
//! name = "homelab"
//! url = "https://box.example.com/admin"
//! domains = ["example.com", "example.org"]
//! credential = "op-item-uuid"
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::{Registry, ServerRecord, TargetList};

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV: &str = "BOXALIAS_CONFIG";

/// One `[[servers]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    /// Registry key.
    pub name: String,
    /// Admin API base URL.
    pub url: String,
    /// Domains this server handles, in file order.
    pub domains: Vec<String>,
    /// Opaque credential-provider reference.
    #[serde(default)]
    pub credential: String,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Forwarding-target addresses, in file order.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Server entries, in file order.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Config {
    /// Loads the configuration from `$BOXALIAS_CONFIG`, or from
    /// `boxalias/config.toml` under the user configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be located, read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        debug!(path = %path.display(), "loading configuration");
        let raw = fs::read_to_string(&path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the TOML is malformed.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| Error::Config(err.to_string()))
    }

    /// Builds the registry and target list, registering servers in file
    /// order.
    #[must_use]
    pub fn into_parts(self) -> (Registry, TargetList) {
        let mut registry = Registry::new();
        for entry in self.servers {
            registry.register(ServerRecord::new(
                entry.name,
                entry.url,
                entry.domains,
                entry.credential,
            ));
        }
        debug!(
            servers = registry.len(),
            targets = self.targets.len(),
            "configuration ingested"
        );
        (registry, TargetList::new(self.targets))
    }
}

/// Resolves the configuration file path.
fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("boxalias").join("config.toml"))
        .ok_or_else(|| Error::Config("cannot determine the user configuration directory".into()))
}
