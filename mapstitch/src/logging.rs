//! Logging infrastructure for mapstitch.
//!
//! Structured logging goes to two places:
//! - the configured log file (cleared on session start)
//! - stderr, so stdout stays free for envelope output
//!
//! `RUST_LOG` overrides the default level.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging system.
///
/// Creates the log file's directory if needed, clears any previous log,
/// and sets up output to both the file and stderr.
///
/// # Arguments
///
/// * `log_file` - Path of the log file (e.g. `~/.mapstitch/mapstitch.log`)
/// * `debug` - Default to `debug` level instead of `info`
///
/// # Errors
///
/// Returns error if the directory cannot be created or the file cannot be cleared
pub fn init_logging(log_file: &Path, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (dir, name) = split_log_path(log_file)?;
    fs::create_dir_all(dir)?;
    fs::write(log_file, "")?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

fn split_log_path(log_file: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let name = log_file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", log_file.display()),
        )
    })?;
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false), "info");
        assert_eq!(default_level(true), "debug");
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/mapstitch.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "mapstitch.log");

        let (dir, name) = split_log_path(Path::new("mapstitch.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "mapstitch.log");
    }

    #[test]
    fn test_split_log_path_without_file_name() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_nested_directory_creation() {
        // init_logging installs a global subscriber, so only the file side is
        // exercised here.
        let temp = TempDir::new().unwrap();
        let log_file: PathBuf = temp.path().join("deep/nested/mapstitch.log");
        let (dir, _) = split_log_path(&log_file).unwrap();

        fs::create_dir_all(dir).unwrap();
        fs::write(&log_file, "old log data").unwrap();
        fs::write(&log_file, "").unwrap();

        assert_eq!(fs::read_to_string(&log_file).unwrap(), "");
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }
}
