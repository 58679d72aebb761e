//! Key-value blob stores the save manager writes the container into.
//!
//! The manager only needs three operations and assumes nothing beyond
//! "last write wins". Two backends ship with the crate:
//!
//! - [`MemoryStore`]: an in-process map, for tests and ephemeral sessions.
//! - [`SqliteStore`]: one row per name in an `SQLite` database, with
//!   checksums and rotating backups.

pub mod sqlite;

use std::collections::HashMap;

use tracing::debug;

use crate::config::PersistenceConfig;
use crate::error::{KeepsakeError, Result};

pub use sqlite::SqliteStore;

/// Named string storage.
pub trait KeyValueStore {
    /// The value stored under `name`, or `default` when absent.
    ///
    /// # Errors
    /// Backend failures only; a missing name is not an error.
    fn get_string(&self, name: &str, default: &str) -> Result<String>;

    /// Store `value` under `name`, replacing any previous value.
    ///
    /// # Errors
    /// Backend failures.
    fn set_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Make previous writes durable.
    ///
    /// # Errors
    /// Backend failures.
    fn flush(&mut self) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_string(&self, name: &str, default: &str) -> Result<String> {
        (**self).get_string(name, default)
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        (**self).set_string(name, value)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Open the backend named by `config.backend`.
///
/// # Errors
/// Returns [`KeepsakeError::Config`] for an unknown backend, or the backend's
/// own open error.
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn KeyValueStore>> {
    match config.backend.as_str() {
        "sqlite" => Ok(Box::new(SqliteStore::open(&config.path, config)?)),
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(KeepsakeError::Config(format!("unknown store backend: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    flushes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access to a stored value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// How many times [`KeyValueStore::flush`] was called.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, name: &str, default: &str) -> Result<String> {
        Ok(self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        debug!(name, bytes = value.len(), "Stored value in memory");
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
