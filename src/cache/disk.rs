//! Disk-backed subtitle cache
//!
//! One `{fingerprint}.json` file per entry. Writes land in a uniquely named
//! temp file first and are renamed into place, so a reader (or a restart after
//! a crash) never sees a half-written entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CacheEntry, SubtitleCache};
use crate::error::CacheError;
use crate::models::{Fingerprint, SubtitleTrack};

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Number of key-striped locks; must divide 256
const LOCK_STRIPES: usize = 64;

/// Temp files older than this are leftovers of an interrupted write
const TEMP_FILE_GRACE: Duration = Duration::from_secs(5 * 60);

pub struct DiskCache {
    cache_dir: PathBuf,
    ttl: Duration,
    /// Serializes read/write/evict of the same fingerprint without blocking other keys
    locks: Vec<Mutex<()>>,
}

impl DiskCache {
    /// Opens the cache at `cache_dir`, creating the directory if needed
    pub async fn open(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();

        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::DirectoryCreationFailed {
                path: cache_dir.clone(),
                source: e,
            })?;

        tracing::info!(cache_dir = %cache_dir.display(), ttl_secs = ttl.as_secs(), "Opened disk cache");

        Ok(Self {
            cache_dir,
            ttl,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", fingerprint, ENTRY_EXTENSION))
    }

    fn lock_for(&self, fingerprint: &Fingerprint) -> &Mutex<()> {
        let stripe = u8::from_str_radix(&fingerprint.as_str()[..2], 16).unwrap_or(0);
        &self.locks[stripe as usize % LOCK_STRIPES]
    }

    /// Reads the entry at `path`. Missing files are a miss; corrupt files are removed and are a miss.
    ///
    /// Caller must hold the fingerprint's lock.
    async fn load_entry(
        &self,
        fingerprint: &Fingerprint,
        path: &Path,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == fingerprint.as_str() => Ok(Some(entry)),
            Ok(entry) => {
                tracing::warn!(
                    path = %path.display(),
                    stored_key = %entry.key,
                    "Cache entry key does not match its file, discarding"
                );
                remove_if_exists(path).await?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache entry, discarding");
                remove_if_exists(path).await?;
                Ok(None)
            }
        }
    }

    /// Atomically replaces the entry file for `fingerprint`
    async fn store_entry(
        &self,
        fingerprint: &Fingerprint,
        entry: &CacheEntry,
    ) -> Result<(), CacheError> {
        let content = serde_json::to_vec(entry)?;
        let path = self.entry_path(fingerprint);
        let temp_path = self.cache_dir.join(format!(
            "{}.{}.{}",
            fingerprint,
            Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));

        let _guard = self.lock_for(fingerprint).lock().await;

        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| CacheError::WriteFailed {
                path: temp_path.clone(),
                source: e,
            })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            if let Err(cleanup) = remove_if_exists(&temp_path).await {
                tracing::warn!(error = %cleanup, "Failed to clean up cache temp file");
            }
            return Err(CacheError::WriteFailed { path, source: e });
        }

        Ok(())
    }

    /// Evicts the entry at `path` if stale or corrupt. Returns whether a stale entry was removed.
    async fn sweep_entry(&self, fingerprint: &Fingerprint, path: &Path) -> Result<bool, CacheError> {
        let _guard = self.lock_for(fingerprint).lock().await;

        match self.load_entry(fingerprint, path).await? {
            Some(entry) if !entry.is_fresh(Utc::now(), self.ttl) => {
                remove_if_exists(path).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Removes a temp file abandoned by an interrupted write
    async fn sweep_temp_file(&self, path: &Path) -> Result<bool, CacheError> {
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| CacheError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();

        if age < TEMP_FILE_GRACE {
            return Ok(false);
        }

        remove_if_exists(path).await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl SubtitleCache for DiskCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(fingerprint);
        let _guard = self.lock_for(fingerprint).lock().await;

        let Some(entry) = self.load_entry(fingerprint, &path).await? else {
            return Ok(None);
        };

        if entry.is_fresh(Utc::now(), self.ttl) {
            return Ok(Some(entry));
        }

        tracing::debug!(fingerprint = %fingerprint, stored_at = %entry.stored_at, "Evicting stale cache entry");
        remove_if_exists(&path).await?;
        Ok(None)
    }

    async fn put(
        &self,
        fingerprint: &Fingerprint,
        tracks: &[SubtitleTrack],
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(fingerprint, tracks.to_vec());
        self.store_entry(fingerprint, &entry).await
    }

    async fn sweep(&self) -> Result<usize, CacheError> {
        let mut dir = tokio::fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::ReadFailed {
                path: self.cache_dir.clone(),
                source: e,
            })?;

        let mut removed = 0;

        loop {
            let dir_entry = match dir.next_entry().await {
                Ok(Some(dir_entry)) => dir_entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(CacheError::ReadFailed {
                        path: self.cache_dir.clone(),
                        source: e,
                    })
                }
            };

            let path = dir_entry.path();
            let extension = path.extension().and_then(|ext| ext.to_str());

            let result = match extension {
                Some(ENTRY_EXTENSION) => {
                    let fingerprint = path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .and_then(Fingerprint::from_hex);
                    match fingerprint {
                        Some(fingerprint) => self.sweep_entry(&fingerprint, &path).await,
                        None => continue,
                    }
                }
                Some(TEMP_EXTENSION) => self.sweep_temp_file(&path).await,
                _ => continue,
            };

            match result {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to sweep cache file"),
            }
        }

        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::RemoveFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
