//! Log writer module
//!
//! Thread-safe log output to files or stdout/stderr. The targets are chosen
//! once at startup from the logging settings.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Info and access log target
    info: LogTarget,
    /// Warning and error log target
    error: LogTarget,
    /// Whether debug lines are written
    debug: bool,
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>, debug: bool) -> io::Result<Self> {
        let info = match access_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };
        let error = match error_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stderr,
        };
        Ok(Self { info, error, debug })
    }

    pub fn write_info(&self, message: &str) {
        write_to_target(&self.info, message);
    }

    pub fn write_error(&self, message: &str) {
        write_to_target(&self.error, message);
    }

    pub fn write_debug(&self, message: &str) {
        if self.debug {
            write_to_target(&self.info, message);
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

fn write_to_target(target: &LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => println!("{message}"),
        LogTarget::Stderr => eprintln!("{message}"),
        LogTarget::File(file) => {
            let mut f = file.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(f, "{message}");
        }
    }
}

/// Initialize the global log writer.
///
/// Call once at startup; a second call fails with `AlreadyExists`.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    debug: bool,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, debug)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_targets() {
        let dir = TempDir::new().unwrap();
        let info_path = dir.path().join("logs/access.log");
        let error_path = dir.path().join("logs/error.log");

        let writer = LogWriter::new(
            info_path.to_str(),
            error_path.to_str(),
            false,
        )
        .unwrap();
        writer.write_info("hello");
        writer.write_error("boom");
        writer.write_debug("hidden");

        assert_eq!(std::fs::read_to_string(&info_path).unwrap(), "hello\n");
        assert_eq!(std::fs::read_to_string(&error_path).unwrap(), "boom\n");
    }

    #[test]
    fn test_debug_enabled() {
        let dir = TempDir::new().unwrap();
        let info_path = dir.path().join("access.log");

        let writer = LogWriter::new(info_path.to_str(), None, true).unwrap();
        writer.write_debug("visible");

        assert_eq!(std::fs::read_to_string(&info_path).unwrap(), "visible\n");
    }
}
