//! Log writer module
//!
//! Thread-safe log writing to files or stdout/stderr, plus the level filter
//! shared by every logging function.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use parking_lot::Mutex;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Severity of a log line, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown log level `{other}`"),
            )),
        }
    }
}

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(File),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(open_log_file(path)?)),
            None => Ok(fallback),
        }
    }

    fn write_line(&mut self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                let _ = writeln!(file, "{message}");
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    level: Level,
    /// Access and info lines
    access: Mutex<LogTarget>,
    /// Warnings and errors
    error: Mutex<LogTarget>,
}

impl LogWriter {
    fn new(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            level,
            access: Mutex::new(LogTarget::open(access_log_file, LogTarget::Stdout)?),
            error: Mutex::new(LogTarget::open(error_log_file, LogTarget::Stderr)?),
        })
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub fn write_access(&self, message: &str) {
        self.access.lock().write_line(message);
    }

    pub fn write_error(&self, message: &str) {
        self.error.lock().write_line(message);
    }

    /// Info lines share the access target
    pub fn write_info(&self, message: &str) {
        self.access.lock().write_line(message);
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

/// Initialize the global log writer
///
/// Called once at startup; fails if a log file cannot be opened or the
/// writer was already installed.
pub fn init(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global log writer, if `init()` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

pub fn is_initialized() -> bool {
    LOG_WRITER.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_parsing() {
        assert_eq!("ERROR".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" info ".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("trace".parse::<Level>().unwrap(), Level::Debug);
        assert!("loud".parse::<Level>().is_err());
        assert!(Level::Error < Level::Debug);
    }

    #[test]
    fn test_file_targets() {
        let dir = TempDir::new().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");
        let writer = LogWriter::new(
            Level::Info,
            Some(access.to_str().unwrap()),
            Some(error.to_str().unwrap()),
        )
        .unwrap();

        writer.write_access("GET /assets/app.js 200");
        writer.write_info("started");
        writer.write_error("[ERROR] boom");

        let access = std::fs::read_to_string(access).unwrap();
        assert_eq!(access, "GET /assets/app.js 200\nstarted\n");
        assert_eq!(std::fs::read_to_string(error).unwrap(), "[ERROR] boom\n");
    }
}
