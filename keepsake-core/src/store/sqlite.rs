//! `SQLite` key-value store.
//!
//! Every name is one row:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_entries (
//!     name       TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! - WAL mode keeps reads cheap while the game writes; [`flush`] checkpoints.
//! - An optional CRC-32 of the value detects blob corruption on read.
//! - Backups go through `SQLite`'s online-backup API.
//!
//! [`flush`]: crate::store::KeyValueStore::flush

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use crc32fast::Hasher;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::store::KeyValueStore;

const BACKUP_PAGES_PER_STEP: std::os::raw::c_int = 256;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_entries (
    name       TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// CRC-32 of a stored value, as written to the `checksum` column.
fn checksum(value: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(value.as_bytes());
    format!("{:08x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Handle to an open `SQLite` database used as a key-value store.
///
/// ```no_run
/// # use keepsake_core::config::PersistenceConfig;
/// # use keepsake_core::store::{KeyValueStore, SqliteStore};
/// let mut store = SqliteStore::open("slot1.db", &PersistenceConfig::default())?;
/// store.set_string("SaveData", r#"{"components":[]}"#)?;
/// store.flush()?;
/// # Ok::<(), keepsake_core::KeepsakeError>(())
/// ```
pub struct SqliteStore {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) on `SQLite` failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Keepsake store opened"
        );

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) on `SQLite` failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Delete the row for `name`. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) on `SQLite` failures.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_entries WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    /// All stored names, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) on `SQLite` failures.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name FROM kv_entries ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Copy the database to `dest` with the online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) on `SQLite` failures.
    pub fn backup<P: AsRef<Path>>(&self, dest: P) -> Result<()> {
        let start = Instant::now();
        let dest = dest.as_ref();
        let mut target = Connection::open(dest)?;
        rusqlite::backup::Backup::new(&self.conn, &mut target)?.run_to_completion(
            BACKUP_PAGES_PER_STEP,
            Duration::from_millis(50),
            None,
        )?;
        info!(
            dest = %dest.display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Store backup written"
        );
        Ok(())
    }

    /// Back up to `<db>.bak.1`, moving existing slots one number up. Slots
    /// beyond `backup_count` are discarded. In-memory stores have nothing to
    /// back up.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) or
    /// [`KeepsakeError::Io`](crate::KeepsakeError::Io) on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        let slots = self.config.backup_count;
        if slots == 0 || self.is_in_memory() {
            return Ok(());
        }

        let overflow = self.backup_slot(slots);
        if overflow.exists() {
            std::fs::remove_file(&overflow)?;
        }
        for slot in (1..slots).rev() {
            let from = self.backup_slot(slot);
            if from.exists() {
                std::fs::rename(&from, self.backup_slot(slot + 1))?;
            }
        }

        self.backup(self.backup_slot(1))?;
        debug!(slots, "Rotated store backups");
        Ok(())
    }

    /// `slot1.db` → `slot1.db.bak.<slot>`.
    fn backup_slot(&self, slot: u32) -> PathBuf {
        let mut name = self.db_path.clone().into_os_string();
        name.push(format!(".bak.{slot}"));
        PathBuf::from(name)
    }

    fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `PRAGMA integrity_check`; `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Database`](crate::KeepsakeError::Database) if the query itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl KeyValueStore for SqliteStore {
    /// A checksum mismatch is logged; the stored value is still returned.
    fn get_string(&self, name: &str, default: &str) -> Result<String> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value, checksum FROM kv_entries WHERE name = ?1")?;
        let row: Option<(String, Option<String>)> = stmt
            .query_row(params![name], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((value, stored_checksum)) = row else {
            return Ok(default.to_string());
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = checksum(&value);
                if expected != actual {
                    warn!(
                        name,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, possible save corruption"
                    );
                }
            }
        }

        Ok(value)
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        let start = Instant::now();
        let checksum = self
            .config
            .checksum_enabled
            .then(|| checksum(value));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO kv_entries (name, value, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![name, value, now, checksum],
        )?;

        debug!(
            name,
            bytes = value.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Stored value"
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.config.wal_mode {
            self.conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PersistenceConfig {
        PersistenceConfig {
            checksum_enabled: true,
            ..PersistenceConfig::default()
        }
    }

    #[test]
    fn round_trip_set_get() {
        let mut store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.set_string("SaveData", r#"{"components":[]}"#).expect("set");
        assert_eq!(
            store.get_string("SaveData", "").expect("get"),
            r#"{"components":[]}"#
        );
    }

    #[test]
    fn missing_name_returns_default() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        assert_eq!(store.get_string("nope", "fallback").expect("get"), "fallback");
    }

    #[test]
    fn upsert_overwrites() {
        let mut store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.set_string("k", "first").expect("set1");
        store.set_string("k", "second").expect("set2");
        assert_eq!(store.get_string("k", "").expect("get"), "second");
        assert_eq!(store.names().expect("names"), vec!["k".to_string()]);
    }

    #[test]
    fn remove_works() {
        let mut store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.set_string("k", "v").expect("set");
        assert!(store.remove("k").expect("remove"));
        assert!(!store.remove("k").expect("remove again"));
        assert_eq!(store.get_string("k", "gone").expect("get"), "gone");
    }

    #[test]
    fn checksum_mismatch_still_returns_value() {
        let mut store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.set_string("k", "payload").expect("set");
        store
            .conn
            .execute(
                "UPDATE kv_entries SET checksum = 'deadbeef' WHERE name = ?1",
                params!["k"],
            )
            .expect("corrupt checksum");
        assert_eq!(store.get_string("k", "").expect("get"), "payload");
    }

    #[test]
    fn integrity_check_passes() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        assert!(store.integrity_check().expect("check"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("slot.db");
        let config = test_config();

        {
            let mut store = SqliteStore::open(&db_path, &config).expect("open");
            store.set_string("SaveData", "blob").expect("set");
            store.flush().expect("flush");
        }

        let store = SqliteStore::open(&db_path, &config).expect("reopen");
        assert_eq!(store.get_string("SaveData", "").expect("get"), "blob");
    }

    #[test]
    fn rotating_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("world.db");
        let mut config = test_config();
        config.backup_count = 2;

        let mut store = SqliteStore::open(&db_path, &config).expect("open");
        store.set_string("SaveData", "blob").expect("set");

        store.create_rotating_backup().expect("backup 1");
        store.create_rotating_backup().expect("backup 2");
        store.create_rotating_backup().expect("backup 3");

        assert!(dir.path().join("world.db.bak.1").exists());
        assert!(dir.path().join("world.db.bak.2").exists());
        assert!(!dir.path().join("world.db.bak.3").exists());

        let backup = SqliteStore::open(dir.path().join("world.db.bak.1"), &config).expect("open backup");
        assert_eq!(backup.get_string("SaveData", "").expect("get"), "blob");
    }

    #[test]
    fn checksum_is_standard_crc32() {
        assert_eq!(checksum("123456789"), "cbf43926");
    }

    #[test]
    fn backups_disabled_or_in_memory_are_no_ops() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.create_rotating_backup().expect("in-memory");

        let dir = tempfile::tempdir().expect("tempdir");
        let config = PersistenceConfig {
            backup_count: 0,
            ..test_config()
        };
        let store = SqliteStore::open(dir.path().join("none.db"), &config).expect("open");
        store.create_rotating_backup().expect("disabled");
        assert!(!dir.path().join("none.db.bak.1").exists());
    }
}
