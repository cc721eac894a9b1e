use std::path::Path;

use chrono::{DateTime, Utc};
use eyre::Result;
use rusqlite::{Connection, OptionalExtension, params};

use crate::config::get_app_data_prefix;
use crate::models::{BookMetadata, LibraryItem, NavigationTarget};
use crate::overlay::Annotation;

/// Saved position of a book: the portable address and, when known, the
/// global fraction as a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLocation {
    pub address: String,
    pub fraction: Option<f64>,
}

impl StoredLocation {
    /// The target to reopen the book at.
    pub fn target(&self) -> NavigationTarget {
        NavigationTarget::parse(&self.address)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnnotation {
    pub value: String,
    pub color: Option<String>,
    pub note: Option<String>,
    pub created: DateTime<Utc>,
}

impl StoredAnnotation {
    pub fn annotation(&self) -> Annotation {
        Annotation::Persistent(self.value.clone())
    }
}

pub struct State {
    conn: Connection,
}

impl State {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::open(&prefix.join("states.db"))
    }

    pub fn open(filepath: &Path) -> Result<Self> {
        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(filepath)?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS reading_states (
                filepath TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                fraction REAL
            );

            CREATE TABLE IF NOT EXISTS library (
                last_read DATETIME DEFAULT (datetime('now')),
                filepath TEXT PRIMARY KEY,
                title TEXT,
                author TEXT,
                reading_progress REAL,
                FOREIGN KEY (filepath) REFERENCES reading_states(filepath)
                ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                filepath TEXT,
                value TEXT NOT NULL,
                color TEXT,
                note TEXT,
                created DATETIME NOT NULL,
                FOREIGN KEY (filepath) REFERENCES reading_states(filepath)
                ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    pub fn get_from_history(&self) -> Result<Vec<LibraryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT last_read, filepath, title, author, reading_progress FROM library ORDER BY last_read DESC",
        )?;
        let items = stmt.query_map([], |row| {
            Ok(LibraryItem {
                last_read: row.get(0)?,
                filepath: row.get(1)?,
                title: row.get(2)?,
                author: row.get(3)?,
                reading_progress: row.get(4)?,
            })
        })?;
        Ok(items.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_from_library(&self, filepath: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM reading_states WHERE filepath=?", params![filepath])?;
        Ok(())
    }

    pub fn get_last_read(&self) -> Result<Option<String>> {
        let library = self.get_from_history()?;
        Ok(library.into_iter().next().map(|item| item.filepath))
    }

    pub fn get_last_location(&self, filepath: &str) -> Result<Option<StoredLocation>> {
        let location = self
            .conn
            .query_row(
                "SELECT address, fraction FROM reading_states WHERE filepath=?",
                params![filepath],
                |row| {
                    Ok(StoredLocation {
                        address: row.get(0)?,
                        fraction: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(location)
    }

    /// Upsert without replacing the row, so library and annotation rows
    /// that cascade from it survive.
    pub fn set_last_location(&self, filepath: &str, location: &StoredLocation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reading_states (filepath, address, fraction) VALUES (?1, ?2, ?3)
             ON CONFLICT(filepath) DO UPDATE SET address = ?2, fraction = ?3",
            params![filepath, location.address, location.fraction],
        )?;
        Ok(())
    }

    pub fn update_library(
        &self,
        filepath: &str,
        metadata: &BookMetadata,
        reading_progress: Option<f64>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO library (last_read, filepath, title, author, reading_progress) VALUES (?, ?, ?, ?, ?)",
            params![
                Utc::now(),
                filepath,
                metadata.title,
                metadata.creator,
                reading_progress
            ],
        )?;
        Ok(())
    }

    fn annotation_id(filepath: &str, value: &str) -> String {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(format!("{}{}", filepath, value).as_bytes());
        hex::encode(hasher.finalize())[..10].to_string()
    }

    /// Store a persistent annotation. Search hits are never stored.
    pub fn insert_annotation(&self, filepath: &str, annotation: &StoredAnnotation) -> Result<()> {
        if Annotation::from_value(&annotation.value).is_search_hit() {
            log::warn!("refusing to store search hit {}", annotation.value);
            return Ok(());
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO annotations (id, filepath, value, color, note, created) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                Self::annotation_id(filepath, &annotation.value),
                filepath,
                annotation.value,
                annotation.color,
                annotation.note,
                annotation.created
            ],
        )?;
        Ok(())
    }

    pub fn delete_annotation(&self, filepath: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM annotations WHERE id=?",
            params![Self::annotation_id(filepath, value)],
        )?;
        Ok(())
    }

    pub fn get_annotations(&self, filepath: &str) -> Result<Vec<StoredAnnotation>> {
        let mut stmt = self.conn.prepare(
            "SELECT value, color, note, created FROM annotations WHERE filepath=? ORDER BY created",
        )?;
        let annotations = stmt.query_map(params![filepath], |row| {
            Ok(StoredAnnotation {
                value: row.get(0)?,
                color: row.get(1)?,
                note: row.get(2)?,
                created: row.get(3)?,
            })
        })?;
        Ok(annotations.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
