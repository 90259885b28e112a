//! IPC protocol types for daemon communication.
//!
//! Each request maps to exactly one library operation. The error responses
//! mirror the service taxonomy: `Invalid` for rejected input, `NotFound`
//! for absent identifiers, `Error` for store failures.

use crate::types::{
    Book, BookUpdate, Category, CategorySummary, LibraryStats, NewBook, ReadingStatus,
};
use serde::{Deserialize, Serialize};

/// Request sent from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Add a new book.
    AddBook { book: NewBook },

    /// Get a book by id.
    GetBook { id: i64 },

    /// List all books, newest first.
    ListBooks,

    /// Replace a book's mutable fields.
    UpdateBook { id: i64, update: BookUpdate },

    /// Delete a book.
    DeleteBook { id: i64 },

    /// Search books by substring.
    SearchBooks { query: String },

    /// Set a book's reading status.
    SetStatus { id: i64, status: ReadingStatus },

    /// Cycle a book's reading status one step.
    ToggleStatus { id: i64 },

    /// Add a category.
    AddCategory { name: String, color: Option<String> },

    /// List categories with derived book counts.
    ListCategories,

    /// Delete a category, reassigning its books to the fallback.
    DeleteCategory { id: i64 },

    /// Per-status book counts.
    Stats,

    /// Ping to check if the daemon is alive.
    Ping,

    /// Shutdown the daemon.
    Shutdown,
}

/// Response sent from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Single book response.
    Book { book: Book },

    /// Multiple books response.
    Books { books: Vec<Book> },

    /// Single category response.
    Category { category: Category },

    /// Categories with counts.
    Categories { categories: Vec<CategorySummary> },

    /// Library stats.
    Stats { stats: LibraryStats },

    /// Category deleted; this many books were reassigned.
    Deleted { reassigned: usize },

    /// Identifier not found.
    NotFound { id: i64 },

    /// Request rejected by validation.
    Invalid { message: String },

    /// Operation succeeded.
    Ok,

    /// Pong response to ping.
    Pong,

    /// Store failure.
    Error { message: String },
}

impl Response {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Create a validation-rejection response.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
