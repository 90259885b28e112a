//! Client for connecting to the shelf daemon.

use crate::daemon::{DaemonConfig, is_daemon_running, start_daemon};
use crate::protocol::{Request, Response};
use crate::types::{Book, BookUpdate, Category, CategorySummary, LibraryStats, NewBook, ReadingStatus};
use eyre::{Context, Result, bail};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client for communicating with the shelf daemon.
pub struct Client {
    root: PathBuf,
    stream: UnixStream,
}

impl Client {
    /// Connect to the daemon, optionally auto-starting it if not running.
    pub fn connect(root: &Path, auto_start: bool) -> Result<Self> {
        let config = DaemonConfig::new(root);
        let socket_path = config.socket_path();

        let stream = match UnixStream::connect(&socket_path) {
            Ok(stream) => stream,
            Err(_) if auto_start => {
                if !is_daemon_running(root) {
                    start_daemon(root).context("Failed to auto-start daemon")?;

                    // Wait for daemon to be ready
                    let mut attempts = 0;
                    loop {
                        if attempts > 20 {
                            bail!("Daemon failed to start in time");
                        }
                        std::thread::sleep(Duration::from_millis(50));
                        if let Ok(stream) = UnixStream::connect(&socket_path) {
                            break stream;
                        }
                        attempts += 1;
                    }
                } else {
                    UnixStream::connect(&socket_path).context("Failed to connect to daemon")?
                }
            }
            Err(e) => {
                bail!("Failed to connect to daemon: {}. Is it running?", e);
            }
        };

        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .context("Failed to set read timeout")?;

        Ok(Self {
            root: root.to_path_buf(),
            stream,
        })
    }

    /// Get the store root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Send a request and receive a response.
    fn request(&mut self, request: Request) -> Result<Response> {
        let request_json = serde_json::to_string(&request)?;
        writeln!(self.stream, "{}", request_json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut response_line = String::new();
        reader.read_line(&mut response_line)?;

        let response: Response = serde_json::from_str(&response_line)?;
        Ok(response)
    }

    fn expect_book(response: Response) -> Result<Book> {
        match response {
            Response::Book { book } => Ok(book),
            Response::NotFound { id } => bail!("book not found: {}", id),
            Response::Invalid { message } => bail!("{}", message),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    fn expect_books(response: Response) -> Result<Vec<Book>> {
        match response {
            Response::Books { books } => Ok(books),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Add a new book.
    pub fn add_book(&mut self, book: NewBook) -> Result<Book> {
        let response = self.request(Request::AddBook { book })?;
        Self::expect_book(response)
    }

    /// Get a book by id. `None` when absent.
    pub fn book(&mut self, id: i64) -> Result<Option<Book>> {
        let response = self.request(Request::GetBook { id })?;
        match response {
            Response::Book { book } => Ok(Some(book)),
            Response::NotFound { .. } => Ok(None),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// List all books, newest first.
    pub fn books(&mut self) -> Result<Vec<Book>> {
        let response = self.request(Request::ListBooks)?;
        Self::expect_books(response)
    }

    /// Replace a book's mutable fields.
    pub fn update_book(&mut self, id: i64, update: BookUpdate) -> Result<Book> {
        let response = self.request(Request::UpdateBook { id, update })?;
        Self::expect_book(response)
    }

    /// Delete a book.
    pub fn delete_book(&mut self, id: i64) -> Result<()> {
        let response = self.request(Request::DeleteBook { id })?;
        match response {
            Response::Ok => Ok(()),
            Response::NotFound { id } => bail!("book not found: {}", id),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Search books by substring.
    pub fn search(&mut self, query: &str) -> Result<Vec<Book>> {
        let response = self.request(Request::SearchBooks {
            query: query.to_string(),
        })?;
        Self::expect_books(response)
    }

    /// Set a book's reading status.
    pub fn set_status(&mut self, id: i64, status: ReadingStatus) -> Result<Book> {
        let response = self.request(Request::SetStatus { id, status })?;
        Self::expect_book(response)
    }

    /// Cycle a book's reading status one step.
    pub fn toggle_status(&mut self, id: i64) -> Result<Book> {
        let response = self.request(Request::ToggleStatus { id })?;
        Self::expect_book(response)
    }

    /// Add a category.
    pub fn add_category(&mut self, name: &str, color: Option<&str>) -> Result<Category> {
        let response = self.request(Request::AddCategory {
            name: name.to_string(),
            color: color.map(String::from),
        })?;
        match response {
            Response::Category { category } => Ok(category),
            Response::Invalid { message } => bail!("{}", message),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// List categories with derived book counts.
    pub fn categories(&mut self) -> Result<Vec<CategorySummary>> {
        let response = self.request(Request::ListCategories)?;
        match response {
            Response::Categories { categories } => Ok(categories),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Delete a category. Returns the number of reassigned books.
    pub fn delete_category(&mut self, id: i64) -> Result<usize> {
        let response = self.request(Request::DeleteCategory { id })?;
        match response {
            Response::Deleted { reassigned } => Ok(reassigned),
            Response::NotFound { id } => bail!("category not found: {}", id),
            Response::Invalid { message } => bail!("{}", message),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Get per-status book counts.
    pub fn stats(&mut self) -> Result<LibraryStats> {
        let response = self.request(Request::Stats)?;
        match response {
            Response::Stats { stats } => Ok(stats),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Shutdown the daemon.
    pub fn shutdown(&mut self) -> Result<()> {
        let response = self.request(Request::Shutdown)?;
        match response {
            Response::Ok => Ok(()),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }

    /// Ping the daemon.
    pub fn ping(&mut self) -> Result<()> {
        let response = self.request(Request::Ping)?;
        match response {
            Response::Pong => Ok(()),
            Response::Error { message } => bail!("{}", message),
            _ => bail!("Unexpected response"),
        }
    }
}
