use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::document::Document;
use crate::error::StoreError;

/// SQLite-backed store for the singleton map state document.
///
/// The document lives in a single row (`id = 1`); `set_state` is an
/// upsert, so the later of two concurrent writers wins with no merging.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Self::new(Path::new(db_path))
    }

    /// Create the schema and seed the initial document if none exists.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS map_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                state_json TEXT NOT NULL
            )",
            [],
        )?;

        let existing: Option<String> = conn
            .query_row("SELECT state_json FROM map_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        if existing.is_none() {
            let seed = serde_json::to_string(&Document::initial())?;
            conn.execute(
                "INSERT INTO map_state (id, state_json) VALUES (1, ?1)",
                params![seed],
            )?;
        }

        Ok(())
    }

    /// Read the current document, seeding the default if the row is missing.
    pub fn get_state(&self) -> Result<Document, StoreError> {
        let conn = self.conn.lock();

        let row: Option<String> = conn
            .query_row("SELECT state_json FROM map_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match row {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                let doc = Document::initial();
                conn.execute(
                    "INSERT OR IGNORE INTO map_state (id, state_json) VALUES (1, ?1)",
                    params![serde_json::to_string(&doc)?],
                )?;
                Ok(doc)
            }
        }
    }

    /// Replace the stored document atomically.
    pub fn set_state(&self, doc: &Document) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let json = serde_json::to_string(doc)?;

        conn.execute(
            "INSERT INTO map_state (id, state_json) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET state_json = excluded.state_json",
            params![json],
        )?;

        Ok(())
    }
}
