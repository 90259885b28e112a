//! Shared test infrastructure for shelf integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use shelf::{Book, Library, NewBook};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub library: Library,
}

impl TestEnv {
    /// Create a new test environment with an initialized SQLite store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let library = Library::init(temp_dir.path()).expect("Failed to init library");
        Self { temp_dir, library }
    }

    /// Create a test environment over the in-memory backend.
    pub fn in_memory() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let library = Library::in_memory();
        Self { temp_dir, library }
    }

    /// Add a book with just title, author, and category.
    pub fn add_book(&mut self, title: &str, author: &str, category: &str) -> Book {
        self.library
            .add_book(NewBook {
                title: title.to_string(),
                author: author.to_string(),
                isbn: None,
                category: category.to_string(),
                notes: None,
            })
            .expect("Failed to add book")
    }

    /// Add a book with an ISBN.
    pub fn add_book_with_isbn(&mut self, title: &str, author: &str, category: &str, isbn: &str) -> Book {
        self.library
            .add_book(NewBook {
                title: title.to_string(),
                author: author.to_string(),
                isbn: Some(isbn.to_string()),
                category: category.to_string(),
                notes: None,
            })
            .expect("Failed to add book")
    }

    /// Id of the category with the given name.
    pub fn category_id(&self, name: &str) -> i64 {
        self.library
            .categories()
            .expect("Failed to list categories")
            .into_iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no category named {}", name))
            .id
    }
}
