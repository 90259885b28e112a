//! CLI argument parsing for shelf.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shelf",
    about = "A personal book catalog",
    version,
    after_help = "Logs are written to: ~/.local/share/shelf/logs/shelf.log"
)]
pub struct Cli {
    /// Path to the shelf store directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new shelf store in the current directory
    Init,

    /// Add a book to the catalog
    Add {
        /// Book title
        title: String,

        /// Author name
        author: String,

        /// Category name
        #[arg(short, long, default_value = "Other")]
        category: String,

        /// ISBN
        #[arg(short, long)]
        isbn: Option<String>,

        /// Freeform notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List books, newest first
    List {
        /// Filter by status (unread, reading, read)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a book by id
    Get {
        /// Book id
        id: i64,
    },

    /// Edit a book's fields
    Update {
        /// Book id
        id: i64,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New author
        #[arg(short, long)]
        author: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New ISBN
        #[arg(short, long)]
        isbn: Option<String>,

        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Set a book's reading status
    Status {
        /// Book id
        id: i64,

        /// One of: unread, reading, read
        status: String,
    },

    /// Cycle a book's status: unread -> reading -> read -> unread
    Toggle {
        /// Book id
        id: i64,
    },

    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book id
        id: i64,
    },

    /// Search by title, author, category, or ISBN
    Search {
        /// Substring to look for
        query: String,
    },

    /// Show per-status book counts
    Stats,

    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Run the daemon in foreground
    Daemon,

    /// Stop the running daemon
    DaemonStop,

    /// Check daemon status
    DaemonStatus,
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// List categories with book counts
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Display color, e.g. "#667eea"
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a category, moving its books to "Other"
    #[command(alias = "rm")]
    Delete {
        /// Category id
        id: i64,
    },
}
