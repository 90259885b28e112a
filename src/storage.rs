//! SQLite-backed catalog storage.

use crate::catalog::Catalog;
use crate::types::{
    Book, BookUpdate, Category, CategorySummary, LibraryStats, NewBook, ReadingStatus,
};
use chrono::Utc;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage directory name.
const SHELF_DIR: &str = ".shelf";

/// SQLite database file.
const DB_FILE: &str = "shelf.db";

/// Default categories seeded into every store, with the colors the UI
/// historically used. "Other" is the fallback for category deletion.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Fiction", "#667eea"),
    ("Non-Fiction", "#38a169"),
    ("Science", "#3182ce"),
    ("History", "#d69e2e"),
    ("Biography", "#805ad5"),
    ("Other", "#718096"),
];

/// Durable storage handle for the book catalog.
pub struct Storage {
    db: Connection,
}

impl Storage {
    /// Initialize storage in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let shelf_dir = root.join(SHELF_DIR);
        fs::create_dir_all(&shelf_dir).context("Failed to create .shelf directory")?;

        let db = Connection::open(shelf_dir.join(DB_FILE)).context("Failed to open SQLite database")?;

        let mut storage = Self { db };
        storage.init_schema()?;
        storage.seed_defaults()?;

        Ok(storage)
    }

    /// Open existing storage.
    pub fn open(root: &Path) -> Result<Self> {
        let shelf_dir = root.join(SHELF_DIR);
        if !shelf_dir.exists() {
            eyre::bail!("No .shelf directory found. Run 'shelf init' first.");
        }

        let db = Connection::open(shelf_dir.join(DB_FILE)).context("Failed to open SQLite database")?;

        let mut storage = Self { db };
        storage.init_schema()?;
        storage.seed_defaults()?;

        Ok(storage)
    }

    /// Path of the database file under a store root.
    pub fn db_path(root: &Path) -> PathBuf {
        root.join(SHELF_DIR).join(DB_FILE)
    }

    /// Initialize SQLite schema.
    fn init_schema(&self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    author TEXT NOT NULL,
                    isbn TEXT,
                    category TEXT NOT NULL,
                    date_added TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'unread'
                        CHECK (status IN ('unread', 'reading', 'read')),
                    notes TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);

                CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL,
                    color TEXT NOT NULL DEFAULT '#667eea'
                );
            "#,
            )
            .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Idempotently ensure the default categories exist. Safe to call
    /// repeatedly; existing rows are left untouched.
    pub fn seed_defaults(&mut self) -> Result<()> {
        for (name, color) in DEFAULT_CATEGORIES {
            self.db
                .execute(
                    "INSERT OR IGNORE INTO categories (name, color) VALUES (?, ?)",
                    params![name, color],
                )
                .context("Failed to seed default category")?;
        }
        Ok(())
    }

    /// Convert a database row to a Book. Column order must match SELECT_BOOK.
    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        let status_str: String = row.get(6)?;
        let date_added_str: String = row.get(5)?;

        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            isbn: row.get(3)?,
            category: row.get(4)?,
            date_added: chrono::DateTime::parse_from_rfc3339(&date_added_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            status: status_str.parse().unwrap_or_default(),
            notes: row.get(7)?,
        })
    }
}

/// Shared column list so every book query maps through `row_to_book`.
const SELECT_BOOK: &str = "SELECT id, title, author, isbn, category, date_added, status, notes FROM books";

impl Catalog for Storage {
    fn insert_book(&mut self, draft: &NewBook) -> Result<Book> {
        let now = Utc::now();

        self.db
            .execute(
                r#"
                INSERT INTO books (title, author, isbn, category, date_added, status, notes)
                VALUES (?, ?, ?, ?, ?, 'unread', ?)
                "#,
                params![
                    draft.title,
                    draft.author,
                    draft.isbn,
                    draft.category,
                    now.to_rfc3339(),
                    draft.notes,
                ],
            )
            .context("Failed to insert book")?;

        Ok(Book {
            id: self.db.last_insert_rowid(),
            title: draft.title.clone(),
            author: draft.author.clone(),
            isbn: draft.isbn.clone(),
            category: draft.category.clone(),
            status: ReadingStatus::Unread,
            notes: draft.notes.clone(),
            date_added: now,
        })
    }

    fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let mut stmt = self.db.prepare(&format!("{} WHERE id = ?", SELECT_BOOK))?;
        let book = stmt.query_row(params![id], Self::row_to_book).optional()?;
        Ok(book)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .db
            .prepare(&format!("{} ORDER BY date_added DESC, id DESC", SELECT_BOOK))?;
        let books = stmt
            .query_map([], Self::row_to_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    fn update_book(&mut self, id: i64, update: &BookUpdate) -> Result<Option<Book>> {
        let changed = self
            .db
            .execute(
                r#"
                UPDATE books
                SET title = ?, author = ?, isbn = ?, category = ?, status = ?, notes = ?
                WHERE id = ?
                "#,
                params![
                    update.title,
                    update.author,
                    update.isbn,
                    update.category,
                    update.status.as_str(),
                    update.notes,
                    id,
                ],
            )
            .context("Failed to update book")?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_book(id)
    }

    fn delete_book(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .db
            .execute("DELETE FROM books WHERE id = ?", params![id])
            .context("Failed to delete book")?;
        Ok(changed > 0)
    }

    fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        // SQLite LIKE is case-insensitive for ASCII by default.
        let pattern = format!("%{}%", query);
        let mut stmt = self.db.prepare(&format!(
            r#"{}
            WHERE title LIKE ?1 OR author LIKE ?1 OR category LIKE ?1 OR isbn LIKE ?1
            ORDER BY date_added DESC, id DESC"#,
            SELECT_BOOK
        ))?;

        let books = stmt
            .query_map(params![pattern], Self::row_to_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    fn stats(&self) -> Result<LibraryStats> {
        self.db
            .query_row(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'unread'),
                       COUNT(*) FILTER (WHERE status = 'reading'),
                       COUNT(*) FILTER (WHERE status = 'read')
                FROM books
                "#,
                [],
                |row| {
                    Ok(LibraryStats {
                        total: row.get(0)?,
                        unread: row.get(1)?,
                        reading: row.get(2)?,
                        read: row.get(3)?,
                    })
                },
            )
            .context("Failed to compute stats")
    }

    fn insert_category(&mut self, name: &str, color: &str) -> Result<Category> {
        self.db
            .execute(
                "INSERT OR IGNORE INTO categories (name, color) VALUES (?, ?)",
                params![name, color],
            )
            .context("Failed to insert category")?;

        // INSERT OR IGNORE makes duplicates a no-op; either way the row
        // exists now.
        self.find_category(name)?
            .ok_or_else(|| eyre::eyre!("category '{}' missing after insert", name))
    }

    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, name, color FROM categories WHERE id = ?")?;
        let category = stmt
            .query_row(params![id], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                })
            })
            .optional()?;
        Ok(category)
    }

    fn find_category(&self, name: &str) -> Result<Option<Category>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, name, color FROM categories WHERE name = ?")?;
        let category = stmt
            .query_row(params![name], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                })
            })
            .optional()?;
        Ok(category)
    }

    fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let mut stmt = self.db.prepare(
            r#"
            SELECT c.id, c.name, c.color, COUNT(b.id)
            FROM categories c
            LEFT JOIN books b ON b.category = c.name
            GROUP BY c.id, c.name, c.color
            ORDER BY c.id
            "#,
        )?;

        let categories = stmt
            .query_map([], |row| {
                Ok(CategorySummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    book_count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn reassign_books(&mut self, from: &str, to: &str) -> Result<usize> {
        let changed = self
            .db
            .execute(
                "UPDATE books SET category = ? WHERE category = ?",
                params![to, from],
            )
            .context("Failed to reassign books")?;
        Ok(changed)
    }

    fn remove_category(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .db
            .execute("DELETE FROM categories WHERE id = ?", params![id])
            .context("Failed to delete category")?;
        Ok(changed > 0)
    }
}

/// Expose the default palette to the in-memory backend so both seed
/// identically.
pub(crate) fn default_categories() -> impl Iterator<Item = (&'static str, &'static str)> {
    DEFAULT_CATEGORIES.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::init(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    fn draft(title: &str, author: &str, category: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: None,
            category: category.to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_init_creates_db_file() {
        let temp_dir = TempDir::new().unwrap();
        let _storage = Storage::init(temp_dir.path()).unwrap();

        assert!(Storage::db_path(temp_dir.path()).exists());
    }

    #[test]
    fn test_open_without_init_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Storage::open(temp_dir.path()).is_err());
    }

    #[test]
    fn test_insert_and_get_book() {
        let (_temp_dir, mut storage) = setup_test_storage();

        let book = storage
            .insert_book(&NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: Some("978-0441172719".to_string()),
                category: "Science Fiction".to_string(),
                notes: Some("loaned to Sam".to_string()),
            })
            .unwrap();

        assert_eq!(book.status, ReadingStatus::Unread);

        let retrieved = storage.get_book(book.id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Dune");
        assert_eq!(retrieved.isbn.as_deref(), Some("978-0441172719"));
        assert_eq!(retrieved.notes.as_deref(), Some("loaned to Sam"));
        assert_eq!(retrieved.status, ReadingStatus::Unread);
    }

    #[test]
    fn test_list_books_newest_first() {
        let (_temp_dir, mut storage) = setup_test_storage();

        for i in 0..3 {
            storage
                .insert_book(&draft(&format!("Book {}", i), "Author", "Fiction"))
                .unwrap();
        }

        let books = storage.list_books().unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(books[0].title, "Book 2");
        assert_eq!(books[2].title, "Book 0");
    }

    #[test]
    fn test_update_book_preserves_id_and_date() {
        let (_temp_dir, mut storage) = setup_test_storage();

        let book = storage.insert_book(&draft("Dune", "Herbert", "Fiction")).unwrap();

        let updated = storage
            .update_book(
                book.id,
                &BookUpdate {
                    title: "Dune Messiah".to_string(),
                    author: "Frank Herbert".to_string(),
                    isbn: None,
                    category: "Science Fiction".to_string(),
                    status: ReadingStatus::Reading,
                    notes: None,
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, book.id);
        assert_eq!(updated.date_added, book.date_added);
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.status, ReadingStatus::Reading);
    }

    #[test]
    fn test_update_missing_book_returns_none() {
        let (_temp_dir, mut storage) = setup_test_storage();

        let result = storage
            .update_book(
                999,
                &BookUpdate {
                    title: "X".to_string(),
                    author: "Y".to_string(),
                    isbn: None,
                    category: "Z".to_string(),
                    status: ReadingStatus::Unread,
                    notes: None,
                },
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_book() {
        let (_temp_dir, mut storage) = setup_test_storage();

        let book = storage.insert_book(&draft("Dune", "Herbert", "Fiction")).unwrap();

        assert!(storage.delete_book(book.id).unwrap());
        assert!(storage.get_book(book.id).unwrap().is_none());
        assert!(!storage.delete_book(book.id).unwrap());
    }

    #[test]
    fn test_search_matches_all_columns() {
        let (_temp_dir, mut storage) = setup_test_storage();

        storage
            .insert_book(&NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: Some("978-0441172719".to_string()),
                category: "Science Fiction".to_string(),
                notes: None,
            })
            .unwrap();

        for query in ["dune", "HERBERT", "science", "0441172719"] {
            let hits = storage.search_books(query).unwrap();
            assert_eq!(hits.len(), 1, "query '{}' should match", query);
        }

        assert!(storage.search_books("asimov").unwrap().is_empty());
    }

    #[test]
    fn test_seed_defaults_idempotent() {
        let (_temp_dir, mut storage) = setup_test_storage();

        storage.seed_defaults().unwrap();
        storage.seed_defaults().unwrap();

        let categories = storage.list_categories().unwrap();
        assert_eq!(categories.len(), 6);
        assert!(categories.iter().any(|c| c.name == "Other"));
    }

    #[test]
    fn test_insert_duplicate_category_is_noop() {
        let (_temp_dir, mut storage) = setup_test_storage();

        let first = storage.insert_category("Poetry", "#aabbcc").unwrap();
        let second = storage.insert_category("Poetry", "#ffffff").unwrap();

        // Same row comes back; the duplicate insert changed nothing.
        assert_eq!(first.id, second.id);
        assert_eq!(second.color, "#aabbcc");
    }

    #[test]
    fn test_category_counts_derived_from_books() {
        let (_temp_dir, mut storage) = setup_test_storage();

        storage.insert_book(&draft("A", "X", "Fiction")).unwrap();
        storage.insert_book(&draft("B", "Y", "Fiction")).unwrap();
        storage.insert_book(&draft("C", "Z", "Science")).unwrap();

        let categories = storage.list_categories().unwrap();
        let fiction = categories.iter().find(|c| c.name == "Fiction").unwrap();
        let science = categories.iter().find(|c| c.name == "Science").unwrap();
        let history = categories.iter().find(|c| c.name == "History").unwrap();

        assert_eq!(fiction.book_count, 2);
        assert_eq!(science.book_count, 1);
        assert_eq!(history.book_count, 0);
    }

    #[test]
    fn test_reassign_books() {
        let (_temp_dir, mut storage) = setup_test_storage();

        storage.insert_book(&draft("A", "X", "Science")).unwrap();
        storage.insert_book(&draft("B", "Y", "Science")).unwrap();

        let moved = storage.reassign_books("Science", "Other").unwrap();
        assert_eq!(moved, 2);

        let books = storage.list_books().unwrap();
        assert!(books.iter().all(|b| b.category == "Other"));
    }

    #[test]
    fn test_reopen_preserves_books() {
        let temp_dir = TempDir::new().unwrap();
        let id = {
            let mut storage = Storage::init(temp_dir.path()).unwrap();
            storage.insert_book(&draft("Dune", "Herbert", "Fiction")).unwrap().id
        };

        let storage = Storage::open(temp_dir.path()).unwrap();
        let book = storage.get_book(id).unwrap().unwrap();
        assert_eq!(book.title, "Dune");
    }
}
