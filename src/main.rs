//! shelf CLI - a personal book catalog with SQLite persistence.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use shelf::{
    Book, BookUpdate, Client, Daemon, DaemonConfig, Library, NewBook, ReadingStatus,
    is_daemon_running,
};
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{CategoryCommand, Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelf")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("shelf.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_store_dir(cli: &Cli) -> PathBuf {
    cli.dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn format_status(status: &ReadingStatus) -> ColoredString {
    match status {
        ReadingStatus::Unread => "unread".yellow(),
        ReadingStatus::Reading => "reading".blue(),
        ReadingStatus::Read => "read".green(),
    }
}

fn print_book_line(book: &Book) {
    let isbn = book
        .isbn
        .as_deref()
        .map(|isbn| format!(" [{}]", isbn))
        .unwrap_or_default();
    println!(
        "{:>4} {} {} by {} ({}){}",
        book.id.to_string().cyan(),
        format_status(&book.status),
        book.title,
        book.author,
        book.category.dimmed(),
        isbn.dimmed(),
    );
}

fn run(cli: Cli) -> Result<()> {
    let store_dir = get_store_dir(&cli);

    match cli.command {
        Command::Init => {
            Library::init(&store_dir).context("Failed to initialize shelf store")?;
            println!("{} Initialized shelf store in {}", "✓".green(), store_dir.display());
        }

        Command::Add {
            title,
            author,
            category,
            isbn,
            notes,
        } => {
            let mut library = Library::open(&store_dir).context("Failed to open store")?;
            let book = library
                .add_book(NewBook {
                    title,
                    author,
                    isbn,
                    category,
                    notes,
                })
                .context("Failed to add book")?;

            println!("{} Added: {} {}", "✓".green(), book.id.to_string().cyan(), book.title);
        }

        Command::List { status } => {
            let library = Library::open(&store_dir).context("Failed to open store")?;
            let status_filter: Option<ReadingStatus> =
                status.as_deref().and_then(|s| s.parse().ok());

            let books = library.books().context("Failed to list books")?;
            let books: Vec<_> = books
                .into_iter()
                .filter(|b| status_filter.is_none_or(|s| b.status == s))
                .collect();

            if books.is_empty() {
                println!("{}", "No books found".dimmed());
            } else {
                for book in &books {
                    print_book_line(book);
                }
            }
        }

        Command::Get { id } => {
            let library = Library::open(&store_dir).context("Failed to open store")?;
            let book = library.book(id).context("Failed to get book")?;

            println!("{}: {}", "ID".bold(), book.id.to_string().cyan());
            println!("{}: {}", "Title".bold(), book.title);
            println!("{}: {}", "Author".bold(), book.author);
            println!("{}: {}", "Category".bold(), book.category);
            println!("{}: {}", "Status".bold(), format_status(&book.status));
            if let Some(isbn) = &book.isbn {
                println!("{}: {}", "ISBN".bold(), isbn);
            }
            if let Some(notes) = &book.notes {
                println!("{}: {}", "Notes".bold(), notes);
            }
            println!("{}: {}", "Added".bold(), book.date_added);
        }

        Command::Update {
            id,
            title,
            author,
            category,
            isbn,
            notes,
        } => {
            let mut library = Library::open(&store_dir).context("Failed to open store")?;

            // Merge over the existing record; unsupplied fields are kept
            let existing = library.book(id).context("Failed to get book")?;
            let update = BookUpdate {
                title: title.unwrap_or(existing.title),
                author: author.unwrap_or(existing.author),
                isbn: isbn.or(existing.isbn),
                category: category.unwrap_or(existing.category),
                status: existing.status,
                notes: notes.or(existing.notes),
            };

            let book = library.update_book(id, update).context("Failed to update book")?;
            println!("{} Updated: {} {}", "✓".green(), book.id.to_string().cyan(), book.title);
        }

        Command::Status { id, status } => {
            let mut library = Library::open(&store_dir).context("Failed to open store")?;
            let status: ReadingStatus = status.parse().map_err(|e: String| eyre::eyre!(e))?;
            let book = library.set_status(id, status).context("Failed to set status")?;

            println!(
                "{} {} is now {}",
                "✓".green(),
                book.title,
                format_status(&book.status)
            );
        }

        Command::Toggle { id } => {
            let mut library = Library::open(&store_dir).context("Failed to open store")?;
            let book = library.toggle_status(id).context("Failed to toggle status")?;

            println!(
                "{} {} is now {}",
                "✓".green(),
                book.title,
                format_status(&book.status)
            );
        }

        Command::Delete { id } => {
            let mut library = Library::open(&store_dir).context("Failed to open store")?;
            library.delete_book(id).context("Failed to delete book")?;
            println!("{} Deleted book {}", "✓".green(), id.to_string().cyan());
        }

        Command::Search { query } => {
            let library = Library::open(&store_dir).context("Failed to open store")?;
            let books = library.search(&query).context("Failed to search")?;

            if books.is_empty() {
                println!("{}", "No matches".dimmed());
            } else {
                for book in &books {
                    print_book_line(book);
                }
            }
        }

        Command::Stats => {
            let library = Library::open(&store_dir).context("Failed to open store")?;
            let stats = library.stats().context("Failed to compute stats")?;

            println!("{}: {}", "Total".bold(), stats.total);
            println!("{}: {}", "Unread".bold(), stats.unread.to_string().yellow());
            println!("{}: {}", "Reading".bold(), stats.reading.to_string().blue());
            println!("{}: {}", "Read".bold(), stats.read.to_string().green());
        }

        Command::Category { command } => match command {
            CategoryCommand::List => {
                let library = Library::open(&store_dir).context("Failed to open store")?;
                let categories = library.categories().context("Failed to list categories")?;

                for category in &categories {
                    println!(
                        "{:>4} {} {} ({} book{})",
                        category.id.to_string().cyan(),
                        category.color.dimmed(),
                        category.name,
                        category.book_count,
                        if category.book_count == 1 { "" } else { "s" },
                    );
                }
            }

            CategoryCommand::Add { name, color } => {
                let mut library = Library::open(&store_dir).context("Failed to open store")?;
                let category = library
                    .add_category(&name, color.as_deref())
                    .context("Failed to add category")?;

                println!(
                    "{} Category: {} {}",
                    "✓".green(),
                    category.id.to_string().cyan(),
                    category.name
                );
            }

            CategoryCommand::Delete { id } => {
                let mut library = Library::open(&store_dir).context("Failed to open store")?;
                let moved = library.delete_category(id).context("Failed to delete category")?;

                println!(
                    "{} Deleted category {} ({} book{} moved to Other)",
                    "✓".green(),
                    id.to_string().cyan(),
                    moved,
                    if moved == 1 { "" } else { "s" },
                );
            }
        },

        Command::Daemon => {
            println!("{} Starting daemon for {}", "→".blue(), store_dir.display());

            let config = DaemonConfig::new(&store_dir);
            let mut daemon = Daemon::new(config).context("Failed to create daemon")?;

            let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
            rt.block_on(async { daemon.run().await }).context("Daemon error")?;
        }

        Command::DaemonStop => {
            if !is_daemon_running(&store_dir) {
                println!("{} Daemon is not running", "✗".red());
                std::process::exit(1);
            }

            let mut client = Client::connect(&store_dir, false).context("Failed to connect to daemon")?;
            client.shutdown().context("Failed to shutdown daemon")?;
            println!("{} Daemon stopped", "✓".green());
        }

        Command::DaemonStatus => {
            if is_daemon_running(&store_dir) {
                println!("{} Daemon is running", "✓".green());

                if let Ok(mut client) = Client::connect(&store_dir, false)
                    && client.ping().is_ok()
                {
                    println!("  {} Responding to requests", "✓".green());
                }
            } else {
                println!("{} Daemon is not running", "✗".red());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
