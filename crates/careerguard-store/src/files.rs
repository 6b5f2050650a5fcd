//! # Temporary File Storage
//!
//! Short-lived files (rendered PDFs, uploaded resumes awaiting parsing)
//! written under the system temp directory and tracked with an expiry.
//!
//! ## Lifecycle
//!
//! ```text
//! store_file ──▶ tracked ──get_file──▶ bytes
//!                   │
//!                   ├── get_file after expiry ──▶ deleted, Expired
//!                   ├── delete_file ────────────▶ deleted
//!                   └── cleanup (sweep) ────────▶ deleted if expired
//! ```
//!
//! ## Untracked Files
//!
//! The tracking map lives in memory only. After a process restart the map
//! is empty while the files remain on disk. [`TemporaryFileStorage::purge_untracked`]
//! deletes files under the root that no record covers once their
//! modification time is old enough.
//!
//! ## Thread Safety
//!
//! The map is behind a mutex that is never held across an `.await`, so one
//! storage can be shared through an `Arc` between handlers and the sweep.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use careerguard_clock::{SharedClock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Default file lifetime when none is configured.
pub const DEFAULT_FILE_TTL_SECS: i64 = 3_600;

/// Metadata for one tracked temporary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempFileRecord {
    /// Generated on-disk location; also the tracking key.
    pub filepath: PathBuf,
    /// Caller-supplied name, reduced to its final component.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// When the file was written.
    pub stored_at: DateTime<Utc>,
    /// First instant at which the file counts as expired.
    pub expires_at: DateTime<Utc>,
}

impl TempFileRecord {
    /// Returns true once `now` has reached the expiry instant.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// File contents plus their tracking record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File bytes.
    pub data: Vec<u8>,
    /// Tracking metadata.
    pub record: TempFileRecord,
}

/// Tracks TTL-bound files under a private temp directory.
#[derive(Debug)]
pub struct TemporaryFileStorage {
    root: PathBuf,
    default_ttl: Duration,
    clock: SharedClock,
    records: Mutex<HashMap<PathBuf, TempFileRecord>>,
}

impl TemporaryFileStorage {
    /// Creates storage under `<system temp>/careerguard/<namespace>`.
    ///
    /// The directory is created on first write.
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        Self::with_root(std::env::temp_dir().join("careerguard").join(namespace))
    }

    /// Creates storage under an explicit root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_ttl: Duration::seconds(DEFAULT_FILE_TTL_SECS),
            clock: SystemClock::shared(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the TTL used by [`store_file_default`](Self::store_file_default).
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Directory files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, TempFileRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `data` to a fresh path and tracks it for `ttl`.
    ///
    /// Only the final component of `filename` is kept, so a name such as
    /// `../../etc/passwd` cannot escape the storage root.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory or file cannot be written.
    pub async fn store_file(
        &self,
        data: &[u8],
        filename: &str,
        ttl: Duration,
    ) -> Result<TempFileRecord> {
        let basename = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("upload");
        let filepath = self.root.join(format!("{}-{}", Uuid::new_v4(), basename));

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&filepath, data).await?;

        let stored_at = self.clock.now();
        let record = TempFileRecord {
            filepath: filepath.clone(),
            filename: basename.to_string(),
            size: data.len() as u64,
            stored_at,
            expires_at: stored_at
                .checked_add_signed(ttl)
                .unwrap_or(if ttl < Duration::zero() {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                }),
        };

        self.lock().insert(filepath, record.clone());
        debug!(
            "Stored temp file {} ({} bytes)",
            record.filepath.display(),
            record.size
        );
        Ok(record)
    }

    /// Writes `data` for the default TTL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory or file cannot be written.
    pub async fn store_file_default(&self, data: &[u8], filename: &str) -> Result<TempFileRecord> {
        self.store_file(data, filename, self.default_ttl).await
    }

    /// Reads a tracked file.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if `filepath` is not tracked
    /// - `StoreError::Expired` if its TTL has passed (the file is deleted)
    /// - `StoreError::Io` if the bytes cannot be read
    pub async fn get_file(&self, filepath: &Path) -> Result<StoredFile> {
        let record = self
            .lock()
            .get(filepath)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(filepath.to_path_buf()))?;

        if record.is_expired(self.clock.now()) {
            self.delete_file(filepath).await;
            return Err(StoreError::Expired(filepath.to_path_buf()));
        }

        let data = tokio::fs::read(filepath).await?;
        Ok(StoredFile { data, record })
    }

    /// Deletes a tracked file and forgets it.
    ///
    /// The file is removed from disk before its record is dropped, so a
    /// cancelled call leaves it tracked. The record is dropped even if the
    /// disk deletion fails; the failure is logged and reported as `false`.
    /// Untracked paths are left alone and also report `false`.
    pub async fn delete_file(&self, filepath: &Path) -> bool {
        if !self.lock().contains_key(filepath) {
            return false;
        }

        let removed = tokio::fs::remove_file(filepath).await;
        if self.lock().remove(filepath).is_none() {
            // Another caller finished the job first
            return false;
        }

        match removed {
            Ok(()) => {
                debug!("Deleted temp file {}", filepath.display());
                true
            }
            Err(e) => {
                warn!("Failed to delete temp file {}: {}", filepath.display(), e);
                false
            }
        }
    }

    /// Deletes every expired file. Returns how many records were dropped.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<PathBuf> = self
            .lock()
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| r.filepath.clone())
            .collect();

        for path in &expired {
            self.delete_file(path).await;
        }

        if !expired.is_empty() {
            info!("Temp file cleanup removed {} expired files", expired.len());
        }
        expired.len()
    }

    /// Deletes regular files under the root that are not tracked and were
    /// last modified at least `older_than` ago. Returns how many were
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the root cannot be listed. A missing
    /// root counts as empty.
    pub async fn purge_untracked(&self, older_than: Duration) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now();
        let mut purged = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if self.lock().contains_key(&path) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };
            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(time) => time.into(),
                Err(e) => {
                    warn!("No modification time for {}: {}", path.display(), e);
                    continue;
                }
            };
            if now.signed_duration_since(modified) < older_than {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Deleted untracked file {}", path.display());
                    purged += 1;
                }
                Err(e) => warn!("Failed to delete untracked file {}: {}", path.display(), e),
            }
        }

        if purged > 0 {
            info!("Removed {} untracked files from {}", purged, self.root.display());
        }
        Ok(purged)
    }

    /// Snapshot of every tracked record.
    #[must_use]
    pub fn tracked(&self) -> Vec<TempFileRecord> {
        self.lock().values().cloned().collect()
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
