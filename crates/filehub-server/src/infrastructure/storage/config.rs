//! TOML-based configuration for the FileHub server.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\FileHub\config.toml`
//! - Linux:    `~/.config/filehub/config.toml` (or `$XDG_CONFIG_HOME/filehub`)
//! - macOS:    `~/Library/Application Support/FileHub/config.toml`
//!
//! or from an explicit path given on the command line.
//!
//! # What does the file look like? (for beginners)
//!
//! ```toml
//! [server]
//! port = 8021
//! bind_address = "localhost"
//! max_clients = 10
//! log_level = "info"
//!
//! [session]
//! idle_timeout_secs = 300
//!
//! [[catalog]]
//! name = "docs"
//! dir = "/srv/docs"
//!
//! [[catalog]]
//! name = "music"
//! dir = "/srv/music"
//! ```
//!
//! Every field has a default through `#[serde(default = "some_fn")]`, so an
//! empty file (or no file at all) is a valid configuration: a server on
//! `localhost:8021` with room for ten clients and no catalogues.
//!
//! # Validation
//!
//! Parsing only checks types. Values that parse but make no sense (port 0,
//! an address that does not resolve, zero client slots) are replaced with
//! their defaults by [`resolve_listener`], which logs a warning for each.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use filehub_core::domain::CatalogueRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::network::ListenerSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// `[[catalog]]` tables, in file order.
    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<CatalogConfig>,
}

/// Listener and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host name or IP literal to listen on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Maximum number of simultaneous sessions.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Per-session behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Seconds a session may wait for its next command. Absent or 0 disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
}

/// One named directory tree to expose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    pub name: String,
    pub dir: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_port() -> u16 {
    8021
}
fn default_bind_address() -> String {
    "localhost".to_string()
}
fn default_max_clients() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            max_clients: default_max_clients(),
            log_level: default_log_level(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Builds the catalogue registry from the `[[catalog]]` tables.
    ///
    /// Entries whose directory is missing or whose name repeats are skipped
    /// with a warning.
    pub fn build_catalogues(&self) -> CatalogueRegistry {
        CatalogueRegistry::from_pairs(
            self.catalogs
                .iter()
                .map(|c| (c.name.clone(), c.dir.as_path())),
        )
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            debug!("loading config from {}", path.display());
            Ok(toml::from_str(&content)?)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Loads `AppConfig` from an explicitly chosen file, which must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// is missing) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Turns the raw `[server]` section into listener settings.
///
/// Invalid values fall back to their defaults with a warning:
/// port 0 becomes 8021, an unresolvable address becomes `127.0.0.1`, and
/// `max_clients = 0` becomes 10.
pub fn resolve_listener(server: &ServerConfig) -> ListenerSettings {
    let port = if server.port == 0 {
        warn!("port 0 is not allowed, using {}", default_port());
        default_port()
    } else {
        server.port
    };

    let bind_addr = resolve_bind_address(&server.bind_address, port).unwrap_or_else(|| {
        warn!(
            "cannot resolve bind address '{}', using 127.0.0.1",
            server.bind_address
        );
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    });

    let max_clients = if server.max_clients == 0 {
        warn!("max_clients must be positive, using {}", default_max_clients());
        default_max_clients()
    } else {
        server.max_clients
    };

    ListenerSettings {
        bind_addr,
        max_clients,
    }
}

/// Resolves a host name or IP literal, preferring an IPv4 address.
fn resolve_bind_address(host: &str, port: u16) -> Option<SocketAddr> {
    let candidates: Vec<SocketAddr> = (host, port).to_socket_addrs().ok()?.collect();
    candidates
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
}

/// Resolves the platform config base directory including the `FileHub` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("FileHub"))
    }

    #[cfg(target_os = "linux")]
    {
        let home = || std::env::var_os("HOME").map(PathBuf::from);
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|h| h.join(".config")))?;
        Some(base.join("filehub"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("FileHub")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
