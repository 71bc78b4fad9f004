//! TOML configuration for the H&F site daemon.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// HTTP listener and request limits.
    pub server: ServerSection,
    /// Table and object storage.
    pub storage: StorageSection,
    /// Admin accounts and sessions.
    pub auth: AuthSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address for the HTTP API.
    pub listen_addr: String,
    /// Base URL uploaded images are served from.
    pub public_url: String,
    /// Largest accepted upload (e.g. `"10MB"`).
    pub max_upload_size: String,
    /// Origins allowed to call the public API. Empty allows any.
    pub cors_origins: Vec<String>,
    /// Mark the session cookie `Secure` (set when served over HTTPS).
    pub secure_cookies: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            max_upload_size: "10MB".to_string(),
            cors_origins: Vec::new(),
            secure_cookies: false,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
    /// Directory for tables and uploaded objects.
    pub data_dir: PathBuf,
    /// Bucket images are uploaded to.
    pub bucket: String,
    /// Object capacity of the memory backend (e.g. `"256MB"`).
    pub memory_max_size: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".hf-site"))
            .unwrap_or_else(|| PathBuf::from(".hf-site"));
        Self {
            backend: "file".to_string(),
            data_dir,
            bucket: hf_site::DEFAULT_BUCKET.to_string(),
            memory_max_size: "256MB".to_string(),
        }
    }
}

/// `[auth]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Session lifetime in hours.
    pub session_ttl_hours: u32,
    /// bcrypt cost for hashes made at startup and by `hash-password`.
    pub bcrypt_cost: u32,
    /// Admin accounts allowed into the dashboard.
    pub admins: Vec<AdminEntry>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_ttl_hours: 12,
            bcrypt_cost: 12,
            admins: Vec::new(),
        }
    }
}

/// One `[[auth.admins]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminEntry {
    pub email: String,
    /// bcrypt hash, as printed by `hfd hash-password`.
    pub password_hash: String,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective upload limit in bytes. Defaults to 10 MB.
    pub fn max_upload_bytes(&self) -> usize {
        parse_size(&self.server.max_upload_size)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(10 * 1_048_576)
    }

    /// The configured `[storage] backend`.
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.storage.backend.as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("unknown storage backend {other:?}, expected file or memory"),
        }
    }

    /// Effective memory-backend capacity in bytes. Defaults to 256 MB.
    pub fn memory_max_bytes(&self) -> u64 {
        parse_size(&self.storage.memory_max_size).unwrap_or(256 * 1_048_576)
    }

    /// Effective session lifetime.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.auth.session_ttl_hours.max(1)))
    }
}

/// Where tables and uploaded images live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Fjall tables and files under the data directory.
    File,
    /// Everything in memory, lost on exit.
    Memory,
}

/// Parse a human-readable size into bytes.
///
/// Supports: `"10MB"`, `"1GB"`, `"512KB"`, `"1048576"` (raw bytes).
fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let (num, unit) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1_073_741_824)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1_048_576)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, 1_024)
    } else {
        (s, 1)
    };
    num.trim().parse::<u64>().ok()?.checked_mul(unit)
}
