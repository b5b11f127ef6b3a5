//! File logging
//!
//! The terminal belongs to the review UI, so log records only ever go to a
//! file. Code logs through the `log` macros; the subscriber installed here
//! bridges those records into `tracing` and writes them as JSON lines.

use anyhow::{Result, anyhow};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;

pub const DEFAULT_LOG_FILE: &str = "lattes-debug.log";

/// Split a log file path into the directory and the file name prefix used by
/// the rolling appender
fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((directory.to_path_buf(), file_name.to_os_string()))
}

/// Route debug logging to a daily-rotated file
pub fn init(log_file: Option<&str>) -> Result<()> {
    let (directory, file_name) = split_log_path(Path::new(log_file.unwrap_or(DEFAULT_LOG_FILE)))?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, file_name);

    tracing_subscriber::fmt()
        .with_writer(file_appender)
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_file_name_logs_to_current_dir() {
        let (dir, name) = split_log_path(Path::new(DEFAULT_LOG_FILE)).expect("valid path");
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, OsString::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_nested_path_is_split() {
        let (dir, name) = split_log_path(Path::new("/tmp/logs/review.log")).expect("valid path");
        assert_eq!(dir, PathBuf::from("/tmp/logs"));
        assert_eq!(name, OsString::from("review.log"));
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
