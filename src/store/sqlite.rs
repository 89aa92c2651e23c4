//! SQLite-backed content store

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::ContentStore;
use crate::core::category::Category;
use crate::core::item::{ContentItem, ItemDetails, NewItem};
use crate::error::Result;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Row counts per category, in registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub counts: Vec<(Category, usize)>,
    pub last_import: Option<i64>,
}

fn table(category: Category) -> &'static str {
    match category {
        Category::Scripture => "scripture_verses",
        Category::Supplication => "supplications",
        Category::NarratedSaying => "narrated_sayings",
    }
}

fn select_sql(category: Category) -> &'static str {
    match category {
        Category::Scripture => {
            "SELECT id, original_text, translation, citation, surah, ayah FROM scripture_verses"
        }
        Category::Supplication => {
            "SELECT id, original_text, translation, citation, title FROM supplications"
        }
        Category::NarratedSaying => {
            "SELECT id, original_text, translation, citation, book, number FROM narrated_sayings"
        }
    }
}

fn row_to_item(category: Category, row: &Row<'_>) -> rusqlite::Result<ContentItem> {
    let details = match category {
        Category::Scripture => ItemDetails::ScriptureVerse {
            surah: row.get(4)?,
            ayah: row.get(5)?,
        },
        Category::Supplication => ItemDetails::Supplication { title: row.get(4)? },
        Category::NarratedSaying => ItemDetails::NarratedSaying {
            book: row.get(4)?,
            number: row.get(5)?,
        },
    };

    Ok(ContentItem {
        id: row.get(0)?,
        original_text: row.get(1)?,
        translation: row.get(2)?,
        citation: row.get(3)?,
        details,
    })
}

impl SqliteStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scripture_verses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                surah INTEGER NOT NULL,
                ayah INTEGER NOT NULL,
                original_text TEXT NOT NULL,
                translation TEXT NOT NULL,
                citation TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS supplications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                original_text TEXT NOT NULL,
                translation TEXT NOT NULL,
                citation TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS narrated_sayings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                book TEXT NOT NULL,
                number TEXT NOT NULL,
                original_text TEXT NOT NULL,
                translation TEXT NOT NULL,
                citation TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_surah_ayah ON scripture_verses(surah, ayah);
            CREATE INDEX IF NOT EXISTS idx_book_number ON narrated_sayings(book, number);
            "#,
        )?;

        Ok(())
    }

    /// Insert a batch in one transaction, returning ids in input order
    ///
    /// A duplicate citation aborts the whole batch.
    pub fn insert_items(&self, items: &[NewItem]) -> Result<Vec<i64>> {
        self.insert_items_then(items, |_| Ok(()))
    }

    /// Like [`insert_items`](Self::insert_items), but `then` runs with the new
    /// ids before commit; an error from it rolls the batch back.
    pub fn insert_items_then<F>(&self, items: &[NewItem], then: F) -> Result<Vec<i64>>
    where
        F: FnOnce(&[i64]) -> Result<()>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            match &item.details {
                ItemDetails::ScriptureVerse { surah, ayah } => tx.execute(
                    "INSERT INTO scripture_verses (surah, ayah, original_text, translation, citation)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![surah, ayah, item.original_text, item.translation, item.citation],
                )?,
                ItemDetails::Supplication { title } => tx.execute(
                    "INSERT INTO supplications (title, original_text, translation, citation)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![title, item.original_text, item.translation, item.citation],
                )?,
                ItemDetails::NarratedSaying { book, number } => tx.execute(
                    "INSERT INTO narrated_sayings (book, number, original_text, translation, citation)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![book, number, item.original_text, item.translation, item.citation],
                )?,
            };
            ids.push(tx.last_insert_rowid());
        }

        then(&ids)?;
        tx.commit()?;
        Ok(ids)
    }

    /// All records of a category, ordered by id
    pub fn list_items(&self, category: Category) -> Result<Vec<ContentItem>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", select_sql(category)))?;
        let rows = stmt.query_map([], |row| row_to_item(category, row))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn count(&self, category: Category) -> Result<usize> {
        let count: i64 = self.conn.lock().query_row(
            &format!("SELECT COUNT(*) FROM {}", table(category)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete every record of a category; returns the number removed
    pub fn clear(&self, category: Category) -> Result<usize> {
        let removed = self
            .conn
            .lock()
            .execute(&format!("DELETE FROM {}", table(category)), [])?;
        Ok(removed)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let mut counts = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            counts.push((category, self.count(category)?));
        }
        let last_import = self
            .get_meta("last_import")?
            .and_then(|v| v.parse::<i64>().ok());

        Ok(StoreStats {
            counts,
            last_import,
        })
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO store_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl ContentStore for SqliteStore {
    fn fetch_item(&self, category: Category, id: i64) -> Result<Option<ContentItem>> {
        let item = self
            .conn
            .lock()
            .query_row(
                &format!("{} WHERE id = ?1", select_sql(category)),
                params![id],
                |row| row_to_item(category, row),
            )
            .optional()?;
        Ok(item)
    }

    fn ping(&self) -> Result<()> {
        self.conn
            .lock()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
