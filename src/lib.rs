//! Shelf: a personal book catalog library.
//!
//! Shelf provides a SQLite-backed book catalog with categories, reading
//! status tracking, and substring search, plus an in-memory backend for
//! use without durable storage.
//!
//! # Example
//!
//! ```no_run
//! use shelf::{Library, NewBook, ReadingStatus};
//! use std::path::Path;
//!
//! // Initialize a new store
//! let mut library = Library::init(Path::new(".")).unwrap();
//!
//! // Catalog a book
//! let book = library.add_book(NewBook {
//!     title: "Dune".into(),
//!     author: "Frank Herbert".into(),
//!     isbn: None,
//!     category: "Science Fiction".into(),
//!     notes: None,
//! }).unwrap();
//! assert_eq!(book.status, ReadingStatus::Unread);
//!
//! // Work through it
//! library.toggle_status(book.id).unwrap();   // reading
//! library.toggle_status(book.id).unwrap();   // read
//!
//! // Find it again
//! let hits = library.search("herbert").unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

mod catalog;
mod memory;
mod storage;
mod store;
mod types;

pub mod client;
pub mod daemon;
pub mod protocol;

// Re-export public API
pub use catalog::Catalog;
pub use client::Client;
pub use daemon::{Daemon, DaemonConfig, is_daemon_running, start_daemon};
pub use memory::MemoryCatalog;
pub use protocol::{Request, Response};
pub use storage::Storage;
pub use store::{Library, StoreError};
pub use types::{
    Book, BookUpdate, Category, CategorySummary, DEFAULT_CATEGORY_COLOR, FALLBACK_CATEGORY,
    LibraryStats, NewBook, ReadingStatus, ValidationError,
};
