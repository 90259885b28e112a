//! High-level library API over a catalog backend.

use crate::catalog::Catalog;
use crate::memory::MemoryCatalog;
use crate::storage::Storage;
use crate::types::{
    Book, BookUpdate, Category, CategorySummary, DEFAULT_CATEGORY_COLOR, FALLBACK_CATEGORY,
    LibraryStats, NewBook, ReadingStatus, ValidationError,
};
use eyre::{Context, Result};
use std::path::Path;

/// Errors that can occur during library operations.
#[derive(Debug)]
pub enum StoreError {
    /// Book not found.
    BookNotFound(i64),
    /// Category not found.
    CategoryNotFound(i64),
    /// Category deletion requires an "Other" fallback category.
    MissingFallbackCategory,
    /// Validation error.
    Validation(ValidationError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::BookNotFound(id) => write!(f, "book not found: {}", id),
            StoreError::CategoryNotFound(id) => write!(f, "category not found: {}", id),
            StoreError::MissingFallbackCategory => {
                write!(f, "no '{}' category to reassign books to", FALLBACK_CATEGORY)
            }
            StoreError::Validation(e) => write!(f, "validation error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// The book library: validation and error taxonomy over an injected backend.
pub struct Library {
    catalog: Box<dyn Catalog>,
}

impl Library {
    /// Initialize a new SQLite-backed library in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let storage = Storage::init(root)?;
        Ok(Self {
            catalog: Box::new(storage),
        })
    }

    /// Open an existing SQLite-backed library.
    pub fn open(root: &Path) -> Result<Self> {
        let storage = Storage::open(root)?;
        Ok(Self {
            catalog: Box::new(storage),
        })
    }

    /// Create a library with no durable storage.
    pub fn in_memory() -> Self {
        Self {
            catalog: Box::new(MemoryCatalog::new()),
        }
    }

    /// Wrap an arbitrary backend.
    pub fn with_catalog(catalog: Box<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Add a book. Status starts as unread with a fresh creation timestamp.
    pub fn add_book(&mut self, draft: NewBook) -> Result<Book> {
        draft
            .validate()
            .map_err(|e| eyre::eyre!(StoreError::Validation(e)))?;

        self.catalog.insert_book(&draft).context("Failed to persist book")
    }

    /// Get a book by id.
    pub fn book(&self, id: i64) -> Result<Book> {
        self.catalog
            .get_book(id)?
            .ok_or_else(|| eyre::eyre!(StoreError::BookNotFound(id)))
    }

    /// All books, newest first.
    pub fn books(&self) -> Result<Vec<Book>> {
        self.catalog.list_books()
    }

    /// Replace a book's mutable fields.
    pub fn update_book(&mut self, id: i64, update: BookUpdate) -> Result<Book> {
        update
            .validate()
            .map_err(|e| eyre::eyre!(StoreError::Validation(e)))?;

        self.catalog
            .update_book(id, &update)
            .context("Failed to persist updated book")?
            .ok_or_else(|| eyre::eyre!(StoreError::BookNotFound(id)))
    }

    /// Set a book's reading status, leaving other fields alone.
    pub fn set_status(&mut self, id: i64, status: ReadingStatus) -> Result<Book> {
        let existing = self.book(id)?;

        let mut update = BookUpdate::from_book(&existing);
        update.status = status;

        self.catalog
            .update_book(id, &update)
            .context("Failed to persist status change")?
            .ok_or_else(|| eyre::eyre!(StoreError::BookNotFound(id)))
    }

    /// Advance a book one step along unread -> reading -> read -> unread.
    pub fn toggle_status(&mut self, id: i64) -> Result<Book> {
        let existing = self.book(id)?;
        self.set_status(id, existing.status.next())
    }

    /// Delete a book. Absent ids are an error, never a silent success.
    pub fn delete_book(&mut self, id: i64) -> Result<()> {
        if !self.catalog.delete_book(id).context("Failed to delete book")? {
            return Err(eyre::eyre!(StoreError::BookNotFound(id)));
        }
        Ok(())
    }

    /// Search over title, author, category, and isbn. An empty or
    /// whitespace-only query resets to the full unfiltered list.
    pub fn search(&self, query: &str) -> Result<Vec<Book>> {
        let query = query.trim();
        if query.is_empty() {
            return self.books();
        }
        self.catalog.search_books(query)
    }

    /// Per-status book counts.
    pub fn stats(&self) -> Result<LibraryStats> {
        self.catalog.stats()
    }

    /// Add a category. Duplicate names are a no-op returning the existing
    /// category; its stored color is kept.
    pub fn add_category(&mut self, name: &str, color: Option<&str>) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(eyre::eyre!(StoreError::Validation(
                ValidationError::EmptyCategoryName
            )));
        }

        self.catalog
            .insert_category(name, color.unwrap_or(DEFAULT_CATEGORY_COLOR))
            .context("Failed to persist category")
    }

    /// All categories with derived book counts.
    pub fn categories(&self) -> Result<Vec<CategorySummary>> {
        self.catalog.list_categories()
    }

    /// Delete a category, reassigning its books to "Other" first. Returns
    /// the number of reassigned books. The "Other" category must exist;
    /// its absence is a configuration error, not a silent cascade.
    pub fn delete_category(&mut self, id: i64) -> Result<usize> {
        let category = self
            .catalog
            .get_category(id)?
            .ok_or_else(|| eyre::eyre!(StoreError::CategoryNotFound(id)))?;

        if self.catalog.find_category(FALLBACK_CATEGORY)?.is_none() {
            return Err(eyre::eyre!(StoreError::MissingFallbackCategory));
        }

        let moved = self
            .catalog
            .reassign_books(&category.name, FALLBACK_CATEGORY)
            .context("Failed to reassign books")?;

        self.catalog
            .remove_category(id)
            .context("Failed to delete category")?;

        Ok(moved)
    }

    /// Idempotently ensure the six default categories exist.
    pub fn seed_defaults(&mut self) -> Result<()> {
        for (name, color) in crate::storage::default_categories() {
            self.catalog.insert_category(name, color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_library() -> Library {
        Library::in_memory()
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

    fn is_store_error(err: &eyre::Report, check: impl Fn(&StoreError) -> bool) -> bool {
        err.downcast_ref::<StoreError>().is_some_and(check)
    }

    #[test]
    fn test_add_book_defaults() {
        let mut library = setup_test_library();

        let book = library
            .add_book(draft("Dune", "Frank Herbert", "Science Fiction"))
            .unwrap();

        assert_eq!(book.status, ReadingStatus::Unread);
        assert!(book.date_added <= chrono::Utc::now());
    }

    #[test]
    fn test_add_book_empty_title_rejected() {
        let mut library = setup_test_library();

        let err = library.add_book(draft("", "Herbert", "Fiction")).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(
            e,
            StoreError::Validation(ValidationError::EmptyTitle)
        )));
    }

    #[test]
    fn test_get_missing_book_is_not_found() {
        let library = setup_test_library();

        let err = library.book(42).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(e, StoreError::BookNotFound(42))));
    }

    #[test]
    fn test_delete_missing_book_is_not_found() {
        let mut library = setup_test_library();

        let err = library.delete_book(42).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(e, StoreError::BookNotFound(42))));
    }

    #[test]
    fn test_update_rejects_empty_category() {
        let mut library = setup_test_library();
        let book = library.add_book(draft("Dune", "Herbert", "Fiction")).unwrap();

        let mut update = BookUpdate::from_book(&book);
        update.category = String::new();

        let err = library.update_book(book.id, update).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(
            e,
            StoreError::Validation(ValidationError::EmptyCategory)
        )));
    }

    #[test]
    fn test_toggle_status_cycles() {
        let mut library = setup_test_library();
        let book = library.add_book(draft("Dune", "Herbert", "Fiction")).unwrap();

        assert_eq!(library.toggle_status(book.id).unwrap().status, ReadingStatus::Reading);
        assert_eq!(library.toggle_status(book.id).unwrap().status, ReadingStatus::Read);
        assert_eq!(library.toggle_status(book.id).unwrap().status, ReadingStatus::Unread);
    }

    #[test]
    fn test_search_empty_query_returns_everything() {
        let mut library = setup_test_library();
        library.add_book(draft("Dune", "Herbert", "Fiction")).unwrap();
        library.add_book(draft("Emma", "Austen", "Fiction")).unwrap();

        assert_eq!(library.search("").unwrap().len(), 2);
        assert_eq!(library.search("   ").unwrap().len(), 2);
        assert_eq!(library.search("dune").unwrap().len(), 1);
    }

    #[test]
    fn test_add_category_empty_name_rejected() {
        let mut library = setup_test_library();

        let err = library.add_category("  ", None).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(
            e,
            StoreError::Validation(ValidationError::EmptyCategoryName)
        )));
    }

    #[test]
    fn test_add_category_default_color() {
        let mut library = setup_test_library();
        let category = library.add_category("Poetry", None).unwrap();
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn test_delete_category_reassigns_books() {
        let mut library = setup_test_library();
        library.add_book(draft("A", "X", "Science")).unwrap();
        library.add_book(draft("B", "Y", "Science")).unwrap();
        library.add_book(draft("C", "Z", "Fiction")).unwrap();

        let science = library
            .categories()
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Science")
            .unwrap();

        let moved = library.delete_category(science.id).unwrap();
        assert_eq!(moved, 2);

        let books = library.books().unwrap();
        assert_eq!(books.iter().filter(|b| b.category == "Other").count(), 2);
        assert!(library.categories().unwrap().iter().all(|c| c.name != "Science"));
    }

    #[test]
    fn test_delete_category_without_fallback_fails() {
        let mut library = setup_test_library();

        let categories = library.categories().unwrap();
        let other = categories.iter().find(|c| c.name == "Other").unwrap();
        let fiction = categories.iter().find(|c| c.name == "Fiction").unwrap();

        // Removing "Other" first leaves no fallback for later deletions.
        library.delete_category(other.id).unwrap();

        let err = library.delete_category(fiction.id).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(
            e,
            StoreError::MissingFallbackCategory
        )));
    }

    #[test]
    fn test_delete_missing_category_is_not_found() {
        let mut library = setup_test_library();

        let err = library.delete_category(999).unwrap_err();
        assert!(is_store_error(&err, |e| matches!(e, StoreError::CategoryNotFound(999))));
    }

    #[test]
    fn test_seed_defaults_idempotent() {
        let mut library = setup_test_library();
        library.seed_defaults().unwrap();
        library.seed_defaults().unwrap();
        assert_eq!(library.categories().unwrap().len(), 6);
    }
}
