//! The SQLite handle behind every store operation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE: &str = "decks.db";

/// Autosave and an interactive `save` may hit the file at the same time.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// An open, fully migrated deck store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store in the platform data directory
    /// (`~/.local/share/deckforge/decks.db` on Linux).
    pub fn new() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("com", "deckforge", "deckforge")
            .map(|dirs| dirs.data_dir().join(DB_FILE))
            .ok_or(StoreError::NoDataDir)
    }

    /// Open or create the store file at `path`, creating missing parent
    /// directories.
    pub fn open_at(path: &Path) -> Result<Self> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                std::fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            _ => {}
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::info!(path = %path.display(), "deck store opened");
        Self::migrated(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing the store, `None` for in-memory stores.
    pub fn path(&self) -> Option<PathBuf> {
        match self.conn.path() {
            Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
            _ => None,
        }
    }
}
