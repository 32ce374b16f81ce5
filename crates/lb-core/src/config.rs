//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML and every section
//! defaults sensibly, so a completely empty file is valid. Values are layered
//! as defaults, then the config file, then `LOOKBOOK_*` environment
//! variables; the CLI applies its own overrides last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::{Error, ImageFormat};

/// Locations searched when no explicit config path is given.
const DEFAULT_PATHS: &[&str] = &[
    "./lookbook.toml",
    "~/.config/lookbook/config.toml",
    "/etc/lookbook/config.toml",
];

/// Longest accepted cache time-to-live: one year.
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub images: ImageConfig,
    pub workers: WorkerConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from an explicit path, or from the first default
    /// location that exists, then apply environment overrides.
    ///
    /// An explicit path that cannot be read is an error; missing default
    /// locations silently fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::find_default()?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Validation(format!("failed to read config {}: {e}", path.display()))
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Self::from_toml(&contents)
    }

    fn find_default() -> Result<Self> {
        for candidate in DEFAULT_PATHS {
            let expanded = shellexpand::tilde(candidate);
            let path = Path::new(expanded.as_ref());
            if path.exists() {
                return Self::read_file(path);
            }
        }
        tracing::debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Apply `LOOKBOOK_*` overrides using `lookup` to resolve variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LOOKBOOK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LOOKBOOK_PORT") {
            self.server.port = parse_env("LOOKBOOK_PORT", &port)?;
        }
        if let Some(path) = lookup("LOOKBOOK_STORAGE_PATH") {
            self.storage.path = PathBuf::from(shellexpand::tilde(&path).as_ref());
        }
        if let Some(size) = lookup("LOOKBOOK_MIN_THUMB_SIZE") {
            self.images.min_thumb_size = parse_env("LOOKBOOK_MIN_THUMB_SIZE", &size)?;
        }
        if let Some(format) = lookup("LOOKBOOK_IMAGE_FORMAT") {
            self.images.format = format.parse()?;
        }
        if let Some(threads) = lookup("LOOKBOOK_WORKERS") {
            self.workers.threads = parse_env("LOOKBOOK_WORKERS", &threads)?;
        }
        if let Some(ttl) = lookup("LOOKBOOK_CACHE_TTL") {
            self.cache.ttl_secs = parse_env("LOOKBOOK_CACHE_TTL", &ttl)?;
        }
        if let Some(url) = lookup("LOOKBOOK_REDIS_URL") {
            self.cache.redis_url = url;
        }
        Ok(())
    }

    /// Check the configuration.
    ///
    /// Values the service cannot run with are returned as an error; anything
    /// merely suspicious comes back as a list of warnings.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.server.port == 0 {
            return Err(Error::Validation("server.port cannot be 0".into()));
        }
        if self.images.min_thumb_size == 0 {
            return Err(Error::Validation("images.min_thumb_size cannot be 0".into()));
        }
        if self.workers.threads == 0 {
            return Err(Error::Validation("workers.threads cannot be 0".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::Validation("cache.ttl_secs cannot be 0".into()));
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(Error::Validation(format!(
                "cache.ttl_secs ({}) exceeds the one-year maximum of {MAX_CACHE_TTL_SECS}",
                self.cache.ttl_secs
            )));
        }

        let mut warnings = Vec::new();

        let cores = num_cpus::get();
        if self.workers.threads > cores * 4 {
            warnings.push(format!(
                "workers.threads ({}) is far above the {cores} available cores",
                self.workers.threads
            ));
        }

        if self.cache.prefix.is_empty() {
            warnings.push("cache.prefix is empty; keys may collide with other tenants".into());
        }

        if self.cache.backend == CacheBackendKind::Redis && cfg!(not(feature = "redis")) {
            warnings.push(
                "cache.backend is redis but this build lacks the `redis` feature".into(),
            );
        }

        Ok(warnings)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{key} has an invalid value: {value}")))
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Where canonical image bytes are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/lookbook"),
        }
    }
}

/// Image normalization and thumbnail policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Smallest edge a thumbnail may have.
    pub min_thumb_size: u32,
    /// Canonical encoded format.
    pub format: ImageFormat,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_thumb_size: 64,
            format: ImageFormat::Jpeg,
        }
    }
}

/// CPU worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub threads: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
        }
    }
}

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Redis,
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Namespace prepended to every request path.
    pub prefix: String,
    pub ttl_secs: u64,
    pub redis_url: String,
    /// How often the in-memory backend drops expired entries.
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            prefix: "lookbook:".into(),
            ttl_secs: 3600,
            redis_url: "redis://127.0.0.1/".into(),
            sweep_interval_secs: 60,
        }
    }
}
