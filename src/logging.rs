//! Tracing configuration and log routing.
//!
//! The application logs to stdout using a compact formatter and, when the log
//! file can be opened, to disk through a non-blocking writer. The file target
//! comes from configuration: an explicit path override, or `logs/docdigest.log`
//! next to the working directory. A failed file setup degrades to stdout-only
//! logging rather than aborting startup.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::get_config;

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "docdigest.log";

// Keeps the non-blocking writer flushing for the process lifetime.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and best-effort file logging.
///
/// Respects `RUST_LOG` for filtering (defaults to `info`). Must run after
/// configuration is initialized, since the log path is read from it.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let file_layer = open_log_file(&log_path(get_config().log_file.as_deref())).map(|file| {
        let (writer, guard) = tracing_appender::non_blocking(file);
        let _ = LOG_GUARD.set(guard);
        fmt::layer().with_writer(writer).with_ansi(false).compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

/// Resolve the log file target: the configured override, or the default
/// location under `logs/`.
fn log_path(configured: Option<&str>) -> PathBuf {
    configured
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE))
}

/// Open the log file in append mode, creating its parent directory as needed.
///
/// Returns `None` when the directory or file cannot be prepared; the caller
/// then skips the file layer entirely.
fn open_log_file(path: &Path) -> Option<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {err}", dir.display());
            return None;
        }
    }
    match File::options().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_defaults_under_logs_directory() {
        assert_eq!(
            log_path(None),
            Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE)
        );
    }

    #[test]
    fn log_path_honors_the_configured_override() {
        assert_eq!(
            log_path(Some("/var/log/docdigest/server.log")),
            PathBuf::from("/var/log/docdigest/server.log")
        );
    }

    #[test]
    fn open_log_file_creates_missing_parent_directories() {
        let dir = std::env::temp_dir().join(format!("docdigest-log-test-{}", std::process::id()));
        let path = dir.join("nested").join("server.log");

        let file = open_log_file(&path);
        assert!(file.is_some());
        assert!(path.exists());

        drop(file);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
