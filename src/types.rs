//! Core data types for the shelf book catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default display color for categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#667eea";

/// Name of the fallback category that absorbs books from deleted categories.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A cataloged book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Store-assigned identifier, immutable
    pub id: i64,

    /// Book title
    pub title: String,

    /// Author name
    pub author: String,

    /// Optional ISBN, format unchecked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    /// Category name. Soft reference: matched against Category.name by
    /// string equality, never enforced as a foreign key.
    pub category: String,

    /// Reading progress
    #[serde(default)]
    pub status: ReadingStatus,

    /// Freeform notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the book was added, immutable
    pub date_added: DateTime<Utc>,
}

/// Reading progress states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    Unread,
    Reading,
    Read,
}

impl ReadingStatus {
    /// Advance one step in the cycle: unread -> reading -> read -> unread.
    pub fn next(&self) -> ReadingStatus {
        match self {
            ReadingStatus::Unread => ReadingStatus::Reading,
            ReadingStatus::Reading => ReadingStatus::Read,
            ReadingStatus::Read => ReadingStatus::Unread,
        }
    }

    /// Stable string form, used in SQL and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Unread => "unread",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Read => "read",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(ReadingStatus::Unread),
            "reading" => Ok(ReadingStatus::Reading),
            "read" => Ok(ReadingStatus::Read),
            other => Err(format!(
                "unknown status '{}': expected unread, reading, or read",
                other
            )),
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named grouping for books with a display color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,

    /// Unique name
    pub name: String,

    /// Display hint, e.g. "#667eea"
    pub color: String,
}

/// A category plus its derived book count. Computed by joining against the
/// books table, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub book_count: i64,
}

/// Derived per-status book counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryStats {
    pub total: i64,
    pub unread: i64,
    pub reading: i64,
    pub read: i64,
}

/// Fields supplied when creating a book. The store assigns the id, the
/// creation timestamp, and the initial unread status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Full replacement of a book's mutable fields. Identifier and date_added
/// are never touched by an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub category: String,
    pub status: ReadingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Validation errors raised at construction boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle,
    EmptyAuthor,
    EmptyCategory,
    EmptyCategoryName,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "title is required"),
            ValidationError::EmptyAuthor => write!(f, "author is required"),
            ValidationError::EmptyCategory => write!(f, "category is required"),
            ValidationError::EmptyCategoryName => write!(f, "category name is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn require(value: &str, err: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(err) } else { Ok(()) }
}

impl NewBook {
    /// Validate the required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, ValidationError::EmptyTitle)?;
        require(&self.author, ValidationError::EmptyAuthor)?;
        require(&self.category, ValidationError::EmptyCategory)?;
        Ok(())
    }
}

impl BookUpdate {
    /// Validate the required fields. Same presence rules as creation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, ValidationError::EmptyTitle)?;
        require(&self.author, ValidationError::EmptyAuthor)?;
        require(&self.category, ValidationError::EmptyCategory)?;
        Ok(())
    }

    /// Build an update that keeps every mutable field of an existing book.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            category: book.category.clone(),
            status: book.status,
            notes: book.notes.clone(),
        }
    }
}

impl Book {
    /// True when the query matches title, author, category, or isbn,
    /// case-insensitively and unanchored.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q)
            || self.author.to_lowercase().contains(&q)
            || self.category.to_lowercase().contains(&q)
            || self
                .isbn
                .as_deref()
                .is_some_and(|isbn| isbn.to_lowercase().contains(&q))
    }
}
