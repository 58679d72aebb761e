//! Configuration for the Keepsake persistence engine.
//!
//! Maps directly to `keepsake.toml`:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [persistence]
//! backend = "sqlite"
//! path = "saves/slot1.db"
//! container_key = "SaveData"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Keepsake configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeepsakeConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Store and save-cycle settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl KeepsakeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `KeepsakeError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::KeepsakeError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether persistence is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "sqlite" or "memory" (ephemeral, tests).
    #[serde(default = "default_sqlite")]
    pub backend: String,
    /// Database file for the sqlite backend.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Well-known name the container blob is stored under.
    #[serde(default = "default_container_key")]
    pub container_key: String,
    /// Use WAL mode for the sqlite backend.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect blob corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Number of rotating backups to keep.
    #[serde(default = "default_3")]
    pub backup_count: u32,
    /// Flush the store after every write of the container.
    #[serde(default = "default_true")]
    pub flush_on_save: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: PathBuf::from("keepsake.db"),
            container_key: "SaveData".to_string(),
            wal_mode: true,
            checksum_enabled: true,
            backup_count: 3,
            flush_on_save: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_sqlite() -> String { "sqlite".to_string() }
fn default_path() -> PathBuf { PathBuf::from("keepsake.db") }
fn default_container_key() -> String { "SaveData".to_string() }
fn default_3() -> u32 { 3 }
