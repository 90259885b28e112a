//! In-memory catalog backend.
//!
//! Same interface as the SQLite backend, no durability. Useful when the
//! catalog is embedded without a writable data directory, and as test
//! infrastructure.

use crate::catalog::Catalog;
use crate::storage::default_categories;
use crate::types::{
    Book, BookUpdate, Category, CategorySummary, LibraryStats, NewBook, ReadingStatus,
};
use chrono::Utc;
use eyre::Result;

/// Volatile catalog holding books and categories in plain vectors.
pub struct MemoryCatalog {
    books: Vec<Book>,
    categories: Vec<Category>,
    next_book_id: i64,
    next_category_id: i64,
}

impl MemoryCatalog {
    /// Create an empty catalog seeded with the default categories.
    pub fn new() -> Self {
        let mut catalog = Self {
            books: Vec::new(),
            categories: Vec::new(),
            next_book_id: 1,
            next_category_id: 1,
        };
        for (name, color) in default_categories() {
            catalog.ensure_category(name, color);
        }
        catalog
    }

    fn ensure_category(&mut self, name: &str, color: &str) -> Category {
        if let Some(existing) = self.categories.iter().find(|c| c.name == name) {
            return existing.clone();
        }
        let category = Category {
            id: self.next_category_id,
            name: name.to_string(),
            color: color.to_string(),
        };
        self.next_category_id += 1;
        self.categories.push(category.clone());
        category
    }

    /// Books sorted newest first, matching the SQLite ordering.
    fn sorted(&self, mut books: Vec<Book>) -> Vec<Book> {
        books.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.id.cmp(&a.id)));
        books
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for MemoryCatalog {
    fn insert_book(&mut self, draft: &NewBook) -> Result<Book> {
        let book = Book {
            id: self.next_book_id,
            title: draft.title.clone(),
            author: draft.author.clone(),
            isbn: draft.isbn.clone(),
            category: draft.category.clone(),
            status: ReadingStatus::Unread,
            notes: draft.notes.clone(),
            date_added: Utc::now(),
        };
        self.next_book_id += 1;
        self.books.push(book.clone());
        Ok(book)
    }

    fn get_book(&self, id: i64) -> Result<Option<Book>> {
        Ok(self.books.iter().find(|b| b.id == id).cloned())
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.sorted(self.books.clone()))
    }

    fn update_book(&mut self, id: i64, update: &BookUpdate) -> Result<Option<Book>> {
        let Some(book) = self.books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };

        book.title = update.title.clone();
        book.author = update.author.clone();
        book.isbn = update.isbn.clone();
        book.category = update.category.clone();
        book.status = update.status;
        book.notes = update.notes.clone();

        Ok(Some(book.clone()))
    }

    fn delete_book(&mut self, id: i64) -> Result<bool> {
        let before = self.books.len();
        self.books.retain(|b| b.id != id);
        Ok(self.books.len() < before)
    }

    fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        let hits = self.books.iter().filter(|b| b.matches(query)).cloned().collect();
        Ok(self.sorted(hits))
    }

    fn stats(&self) -> Result<LibraryStats> {
        let mut stats = LibraryStats {
            total: self.books.len() as i64,
            ..Default::default()
        };
        for book in &self.books {
            match book.status {
                ReadingStatus::Unread => stats.unread += 1,
                ReadingStatus::Reading => stats.reading += 1,
                ReadingStatus::Read => stats.read += 1,
            }
        }
        Ok(stats)
    }

    fn insert_category(&mut self, name: &str, color: &str) -> Result<Category> {
        Ok(self.ensure_category(name, color))
    }

    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    fn find_category(&self, name: &str) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|c| c.name == name).cloned())
    }

    fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        Ok(self
            .categories
            .iter()
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name.clone(),
                color: c.color.clone(),
                book_count: self.books.iter().filter(|b| b.category == c.name).count() as i64,
            })
            .collect())
    }

    fn reassign_books(&mut self, from: &str, to: &str) -> Result<usize> {
        let mut moved = 0;
        for book in self.books.iter_mut().filter(|b| b.category == from) {
            book.category = to.to_string();
            moved += 1;
        }
        Ok(moved)
    }

    fn remove_category(&mut self, id: i64) -> Result<bool> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        Ok(self.categories.len() < before)
    }
}
