//! docbase.toml configuration handling
//!
//! Settings are layered: built-in defaults, then the TOML file, then
//! `DOCBASE_*` environment variables, then command-line flags.

use anyhow::{Context, Result};
use docbase_mongodb::{
    uri_from_host_port, PoolConfig, ValidatedCollectionName, DEFAULT_HOST, DEFAULT_PORT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "docbase.toml";

/// Used when no layer and no URI path names a database
pub const DEFAULT_DATABASE: &str = "tutorial";
pub const DEFAULT_COLLECTION: &str = "users";

pub const ENV_URI: &str = "DOCBASE_URI";
pub const ENV_DATABASE: &str = "DOCBASE_DATABASE";
pub const ENV_COLLECTION: &str = "DOCBASE_COLLECTION";

/// `[connection]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// `[pool]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pool_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_selection_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

impl PoolSection {
    fn into_pool_config(self) -> PoolConfig {
        let defaults = PoolConfig::default();
        PoolConfig {
            min_pool_size: self.min_pool_size.or(defaults.min_pool_size),
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            max_idle_time: defaults.max_idle_time,
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.connect_timeout),
            server_selection_timeout: self
                .server_selection_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.server_selection_timeout),
            app_name: self.app_name.or(defaults.app_name),
        }
    }
}

/// Contents of docbase.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub pool: PoolSection,
}

impl FileConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the explicit file if given (it must exist), else `docbase.toml` in `dir` if present
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Option<(PathBuf, Self)>> {
        if let Some(path) = explicit {
            return Ok(Some((path.to_path_buf(), Self::load(path)?)));
        }

        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.exists() {
            let config = Self::load(&candidate)?;
            return Ok(Some((candidate, config)));
        }
        Ok(None)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub uri: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub collection: Option<String>,
}

/// Where the server is, as the highest layer that said anything about it
#[derive(Debug, Clone, PartialEq, Eq)]
enum Address {
    Uri(String),
    HostPort { host: String, port: u16 },
}

impl Default for Address {
    fn default() -> Self {
        Address::HostPort {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Address {
    /// A URI replaces everything below it; a lone host or port keeps the other half
    fn layer(self, uri: Option<String>, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(uri) = uri {
            return Address::Uri(uri);
        }
        if host.is_none() && port.is_none() {
            return self;
        }
        let (base_host, base_port) = match self {
            Address::HostPort { host, port } => (host, port),
            Address::Uri(_) => (DEFAULT_HOST.to_string(), DEFAULT_PORT),
        };
        Address::HostPort {
            host: host.unwrap_or(base_host),
            port: port.unwrap_or(base_port),
        }
    }

    fn into_uri(self) -> String {
        match self {
            Address::Uri(uri) => uri,
            Address::HostPort { host, port } => uri_from_host_port(&host, port),
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub uri: String,
    /// Database named by file, environment or flag; `None` defers to the URI
    pub database: Option<String>,
    pub collection: ValidatedCollectionName,
    pub pool: PoolConfig,
}

impl Settings {
    /// Merge file, environment and flags over the defaults
    pub fn resolve<F>(file: FileConfig, env: F, flags: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let FileConfig { connection, pool } = file;
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

        let uri = Address::default()
            .layer(connection.uri, connection.host, connection.port)
            .layer(non_empty(ENV_URI), None, None)
            .layer(flags.uri.clone(), flags.host.clone(), flags.port)
            .into_uri();

        let database = flags
            .database
            .clone()
            .or_else(|| non_empty(ENV_DATABASE))
            .or(connection.database.filter(|v| !v.is_empty()));

        let collection = flags
            .collection
            .clone()
            .or_else(|| non_empty(ENV_COLLECTION))
            .or(connection.collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let collection = ValidatedCollectionName::new(&collection)
            .with_context(|| format!("Invalid collection name '{}'", collection))?;

        Ok(Self {
            uri,
            database,
            collection,
            pool: pool.into_pool_config(),
        })
    }
}
