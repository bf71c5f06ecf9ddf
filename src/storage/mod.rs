// src/storage/mod.rs
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::report::models::{EvaluationResult, Status};
use crate::utils::error::StorageError;

const LOCK_RETRY_DELAY_MS: u64 = 50;
const LOCK_TIMEOUT_MS: u64 = 5_000;
const LOCK_STALE_AFTER_MS: u64 = 30_000;
const ISSUE_SEPARATOR: &str = "; ";

/// One row of the client log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Upload Date")]
    pub upload_date: NaiveDate,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Issues")]
    pub issues: String,
}

impl ClientRecord {
    pub fn from_result(result: &EvaluationResult) -> Self {
        Self {
            name: result.subject.clone(),
            upload_date: result.processed_on,
            status: result.status,
            issues: result.issues.join(ISSUE_SEPARATOR),
        }
    }

    pub fn issue_list(&self) -> Vec<&str> {
        self.issues
            .split(ISSUE_SEPARATOR.trim())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Exclusive lock held while the log is written. Removed on drop.
///
/// The file holds the owner's PID. A process killed mid-write leaves it
/// behind, so a lock older than `stale_after` is broken by the next writer.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: PathBuf, timeout: Duration, stale_after: Duration) -> Result<Self, StorageError> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let guard = Self { path };
                    write!(file, "{}", process::id())?;
                    return Ok(guard);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Self::break_if_stale(&path, stale_after)? {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(StorageError::Locked(path.display().to_string()));
                    }
                    tracing::debug!("Waiting for lock {}", path.display());
                    thread::sleep(Duration::from_millis(LOCK_RETRY_DELAY_MS));
                }
                Err(e) => return Err(StorageError::IoError(e)),
            }
        }
    }

    /// Removes the lock at `path` if it was last touched `stale_after` ago or earlier.
    fn break_if_stale(path: &Path, stale_after: Duration) -> Result<bool, StorageError> {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            // Released between our open and this check.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(StorageError::IoError(e)),
        };
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age < stale_after {
            return Ok(false);
        }

        let owner = fs::read_to_string(path).unwrap_or_default();
        tracing::warn!(
            "Breaking stale lock {} (owner pid '{}', {}s old)",
            path.display(),
            owner.trim(),
            age.as_secs()
        );
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

/// Append-only CSV log of processed reports.
pub struct ClientLog {
    path: PathBuf,
    lock_timeout: Duration,
    lock_stale_after: Duration,
}

impl ClientLog {
    /// Creates a ClientLog at `path`, creating the parent directory if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        Ok(Self {
            path,
            lock_timeout: Duration::from_millis(LOCK_TIMEOUT_MS),
            lock_stale_after: Duration::from_millis(LOCK_STALE_AFTER_MS),
        })
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Age at which a leftover lock file is treated as abandoned.
    pub fn with_lock_stale_after(mut self, stale_after: Duration) -> Self {
        self.lock_stale_after = stale_after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// All records in append order. A missing log reads as empty.
    pub fn load(&self) -> Result<Vec<ClientRecord>, StorageError> {
        if !self.path.exists() {
            tracing::debug!("Client log {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    /// Appends one record under the log's lock.
    pub fn append(&self, record: &ClientRecord) -> Result<(), StorageError> {
        let _guard = LockGuard::acquire(self.lock_path(), self.lock_timeout, self.lock_stale_after)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::info!("Appended record for '{}' ({}) to {}", record.name, record.status, self.path.display());
        Ok(())
    }
}
