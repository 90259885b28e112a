//! Background daemon serving the catalog over a Unix socket.
//!
//! The daemon keeps a single writer on the SQLite store; connection tasks
//! forward parsed requests over a channel and the main loop applies them
//! one at a time, so callers never race on writes.

use crate::protocol::{Request, Response};
use crate::store::{Library, StoreError};
use eyre::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Socket file name within the .shelf directory.
const SOCKET_FILE: &str = "daemon.sock";

/// PID file name within the .shelf directory.
const PID_FILE: &str = "daemon.pid";

/// Configuration for the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Root directory containing .shelf
    pub root: PathBuf,
}

impl DaemonConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.root.join(".shelf").join(SOCKET_FILE)
    }

    /// Get the PID file path.
    pub fn pid_path(&self) -> PathBuf {
        self.root.join(".shelf").join(PID_FILE)
    }
}

/// The shelf daemon.
pub struct Daemon {
    config: DaemonConfig,
    library: Library,
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// Create a new daemon instance over the store at the configured root.
    pub fn new(config: DaemonConfig) -> Result<Self> {
        let library = Library::open(&config.root).context("Failed to open library")?;

        Ok(Self {
            config,
            library,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a shutdown handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the daemon (blocking).
    pub async fn run(&mut self) -> Result<()> {
        // Clean up any stale socket
        let socket_path = self.config.socket_path();
        if socket_path.exists() {
            fs::remove_file(&socket_path).ok();
        }

        // Write PID file
        let pid_path = self.config.pid_path();
        fs::write(&pid_path, std::process::id().to_string()).context("Failed to write PID file")?;

        // Create Unix socket listener
        let listener = UnixListener::bind(&socket_path).context("Failed to bind to Unix socket")?;
        listener
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking")?;

        log::info!("Daemon listening on {:?}", socket_path);

        // Channel for client requests
        let (tx, mut rx) = mpsc::channel::<(Request, mpsc::Sender<Response>)>(100);

        // Spawn connection acceptor task
        let shutdown_flag = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            Self::accept_connections(listener, tx, shutdown_flag).await;
        });

        // Main event loop: single writer applies requests in order
        while let Some((request, response_tx)) = rx.recv().await {
            let response = self.handle_request(request);
            let _ = response_tx.send(response).await;

            if self.shutdown.load(Ordering::Relaxed) {
                log::info!("Daemon shutting down");
                break;
            }
        }

        // Cleanup
        fs::remove_file(&socket_path).ok();
        fs::remove_file(&pid_path).ok();

        Ok(())
    }

    /// Accept connections in a background task.
    async fn accept_connections(
        listener: UnixListener,
        tx: mpsc::Sender<(Request, mpsc::Sender<Response>)>,
        shutdown: Arc<AtomicBool>,
    ) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Non-blocking accept with a small sleep so shutdown is noticed
            match listener.accept() {
                Ok((stream, _)) => {
                    let tx_clone = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, tx_clone).await {
                            log::warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Handle a single client connection.
    async fn handle_connection(
        stream: UnixStream,
        tx: mpsc::Sender<(Request, mpsc::Sender<Response>)>,
    ) -> Result<()> {
        stream.set_nonblocking(false)?;

        let reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;

        for line in reader.lines() {
            let line = line.context("Failed to read line")?;
            if line.is_empty() {
                continue;
            }

            let request: Request = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    let response = Response::invalid(format!("malformed request: {}", e));
                    writeln!(writer, "{}", serde_json::to_string(&response)?)?;
                    writer.flush()?;
                    continue;
                }
            };

            let is_shutdown = matches!(request, Request::Shutdown);

            // Send to main loop and wait for the response
            let (resp_tx, mut resp_rx) = mpsc::channel(1);
            tx.send((request, resp_tx))
                .await
                .context("Failed to send request to daemon")?;

            if let Some(response) = resp_rx.recv().await {
                let response_json = serde_json::to_string(&response)?;
                writeln!(writer, "{}", response_json)?;
                writer.flush()?;
            }

            if is_shutdown {
                break;
            }
        }

        Ok(())
    }

    /// Classify a library error into the protocol taxonomy.
    fn classify(err: eyre::Report) -> Response {
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::BookNotFound(id)) => Response::NotFound { id: *id },
            Some(StoreError::CategoryNotFound(id)) => Response::NotFound { id: *id },
            Some(StoreError::Validation(e)) => Response::invalid(e.to_string()),
            Some(StoreError::MissingFallbackCategory) => Response::invalid(err.to_string()),
            None => Response::error(err.to_string()),
        }
    }

    /// Handle a single request.
    fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::AddBook { book } => match self.library.add_book(book) {
                Ok(book) => Response::Book { book },
                Err(e) => Self::classify(e),
            },

            Request::GetBook { id } => match self.library.book(id) {
                Ok(book) => Response::Book { book },
                Err(e) => Self::classify(e),
            },

            Request::ListBooks => match self.library.books() {
                Ok(books) => Response::Books { books },
                Err(e) => Self::classify(e),
            },

            Request::UpdateBook { id, update } => match self.library.update_book(id, update) {
                Ok(book) => Response::Book { book },
                Err(e) => Self::classify(e),
            },

            Request::DeleteBook { id } => match self.library.delete_book(id) {
                Ok(()) => Response::Ok,
                Err(e) => Self::classify(e),
            },

            Request::SearchBooks { query } => match self.library.search(&query) {
                Ok(books) => Response::Books { books },
                Err(e) => Self::classify(e),
            },

            Request::SetStatus { id, status } => match self.library.set_status(id, status) {
                Ok(book) => Response::Book { book },
                Err(e) => Self::classify(e),
            },

            Request::ToggleStatus { id } => match self.library.toggle_status(id) {
                Ok(book) => Response::Book { book },
                Err(e) => Self::classify(e),
            },

            Request::AddCategory { name, color } => {
                match self.library.add_category(&name, color.as_deref()) {
                    Ok(category) => Response::Category { category },
                    Err(e) => Self::classify(e),
                }
            }

            Request::ListCategories => match self.library.categories() {
                Ok(categories) => Response::Categories { categories },
                Err(e) => Self::classify(e),
            },

            Request::DeleteCategory { id } => match self.library.delete_category(id) {
                Ok(reassigned) => Response::Deleted { reassigned },
                Err(e) => Self::classify(e),
            },

            Request::Stats => match self.library.stats() {
                Ok(stats) => Response::Stats { stats },
                Err(e) => Self::classify(e),
            },

            Request::Ping => Response::Pong,

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::Ok
            }
        }
    }
}

/// Check if a daemon is running for the given store path.
pub fn is_daemon_running(root: &Path) -> bool {
    let config = DaemonConfig::new(root);
    let socket_path = config.socket_path();
    let pid_path = config.pid_path();

    // Check if socket exists
    if !socket_path.exists() {
        return false;
    }

    // Check if PID file exists and process is alive
    if let Ok(pid_str) = fs::read_to_string(&pid_path)
        && let Ok(pid) = pid_str.trim().parse::<i32>()
    {
        // Signal 0 checks existence without sending anything
        unsafe {
            if libc::kill(pid, 0) == 0 {
                return true;
            }
        }
    }

    // Stale socket, clean up
    fs::remove_file(&socket_path).ok();
    fs::remove_file(&pid_path).ok();
    false
}

/// Start the daemon as a background process.
pub fn start_daemon(root: &Path) -> Result<()> {
    use std::process::Command;

    let exe = std::env::current_exe().context("Failed to get current executable")?;

    Command::new(exe)
        .args(["--dir", root.to_str().unwrap_or("."), "daemon"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("Failed to spawn daemon process")?;

    // Wait a bit for daemon to start
    std::thread::sleep(Duration::from_millis(100));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewBook;
    use tempfile::TempDir;

    fn setup_test_store() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        Library::init(&root).unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_daemon_config_paths() {
        let config = DaemonConfig::new("/test/path");
        assert_eq!(config.socket_path(), PathBuf::from("/test/path/.shelf/daemon.sock"));
        assert_eq!(config.pid_path(), PathBuf::from("/test/path/.shelf/daemon.pid"));
    }

    #[test]
    fn test_daemon_creation() {
        let (_temp_dir, root) = setup_test_store();
        let config = DaemonConfig::new(&root);
        assert!(Daemon::new(config).is_ok());
    }

    #[test]
    fn test_is_daemon_running_false() {
        let (_temp_dir, root) = setup_test_store();
        assert!(!is_daemon_running(&root));
    }

    #[test]
    fn test_handle_request_maps_errors() {
        let (_temp_dir, root) = setup_test_store();
        let mut daemon = Daemon::new(DaemonConfig::new(&root)).unwrap();

        let response = daemon.handle_request(Request::GetBook { id: 42 });
        assert!(matches!(response, Response::NotFound { id: 42 }));

        let response = daemon.handle_request(Request::AddBook {
            book: NewBook {
                title: String::new(),
                author: "Herbert".to_string(),
                isbn: None,
                category: "Fiction".to_string(),
                notes: None,
            },
        });
        assert!(matches!(response, Response::Invalid { .. }));

        let response = daemon.handle_request(Request::Ping);
        assert!(matches!(response, Response::Pong));
    }
}
