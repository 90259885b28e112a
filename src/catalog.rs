//! Repository seam shared by the SQLite and in-memory backends.

use crate::types::{Book, BookUpdate, Category, CategorySummary, LibraryStats, NewBook};
use eyre::Result;

/// CRUD surface over books and categories.
///
/// `Library` layers validation and the error taxonomy on top; backends only
/// persist. Both the durable SQLite backend and the in-memory backend
/// implement this trait, so the same high-level API works with or without
/// durable storage.
pub trait Catalog {
    /// Insert a validated draft, assigning id, timestamp, and unread status.
    fn insert_book(&mut self, draft: &NewBook) -> Result<Book>;

    /// Fetch a book by id.
    fn get_book(&self, id: i64) -> Result<Option<Book>>;

    /// All books, newest first by creation timestamp.
    fn list_books(&self) -> Result<Vec<Book>>;

    /// Replace a book's mutable fields. Returns `None` when the id is absent.
    fn update_book(&mut self, id: i64, update: &BookUpdate) -> Result<Option<Book>>;

    /// Remove a book. Returns false when the id is absent.
    fn delete_book(&mut self, id: i64) -> Result<bool>;

    /// Case-insensitive unanchored substring match over title, author,
    /// category, and isbn. Same ordering as `list_books`.
    fn search_books(&self, query: &str) -> Result<Vec<Book>>;

    /// Per-status book counts.
    fn stats(&self) -> Result<LibraryStats>;

    /// Insert a category. Duplicate names are a no-op returning the
    /// existing row.
    fn insert_category(&mut self, name: &str, color: &str) -> Result<Category>;

    /// Fetch a category by id.
    fn get_category(&self, id: i64) -> Result<Option<Category>>;

    /// Fetch a category by exact name.
    fn find_category(&self, name: &str) -> Result<Option<Category>>;

    /// All categories with derived book counts, in id order.
    fn list_categories(&self) -> Result<Vec<CategorySummary>>;

    /// Move every book in category `from` to category `to`. Returns the
    /// number of books moved.
    fn reassign_books(&mut self, from: &str, to: &str) -> Result<usize>;

    /// Remove a category row. Returns false when the id is absent.
    fn remove_category(&mut self, id: i64) -> Result<bool>;
}
