//! Best-effort raw payload side log.

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::ScreeningError;

/// Destination for raw upstream screening payloads.
///
/// Implementations must not block screening; the service logs and ignores
/// every error they return.
pub trait PayloadSink: Send + Sync {
    /// Records one raw upstream body for `address`.
    fn record(&self, address: &str, payload: &str) -> Result<(), ScreeningError>;
}

/// Writes each payload to its own JSON file under a directory.
#[derive(Debug, Clone)]
pub struct FilePayloadSink {
    dir: PathBuf,
}

impl FilePayloadSink {
    /// Creates a sink rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the sink directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PayloadSink for FilePayloadSink {
    fn record(&self, address: &str, payload: &str) -> Result<(), ScreeningError> {
        fs::create_dir_all(&self.dir)?;
        let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let path = self
            .dir
            .join(format!("{}-{stamp}.json", file_safe(address)));
        fs::write(path, payload)?;
        Ok(())
    }
}

// Addresses are user input; keep only characters that are safe in file names.
fn file_safe(address: &str) -> String {
    let cleaned: String = address
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
