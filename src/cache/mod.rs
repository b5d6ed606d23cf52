//! Subtitle list cache
//!
//! Provider responses are cached per [`Fingerprint`] for a fixed TTL. Stale
//! entries are dropped lazily when read and eagerly by a periodic sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::models::{Fingerprint, SubtitleTrack};

pub mod disk;
pub mod memory;
pub mod sweeper;

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use sweeper::{spawn_sweeper, SweeperHandle};

/// A cached provider response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub tracks: Vec<SubtitleTrack>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: &Fingerprint, tracks: Vec<SubtitleTrack>) -> Self {
        Self {
            key: fingerprint.to_string(),
            tracks,
            stored_at: Utc::now(),
        }
    }

    /// Whether the entry is younger than `ttl` at `now`
    ///
    /// Entries stamped in the future (clock skew) count as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.stored_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

/// Store for cached subtitle lists
///
/// Implementations own entry lifetime: nothing else mutates or deletes entries.
/// Concurrent calls for the same fingerprint must never expose a partially
/// written entry.
#[async_trait::async_trait]
pub trait SubtitleCache: Send + Sync {
    /// Returns the fresh entry for `fingerprint`, evicting it if it went stale
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError>;

    /// Writes or replaces the entry for `fingerprint`, stamped with the current time
    async fn put(&self, fingerprint: &Fingerprint, tracks: &[SubtitleTrack])
        -> Result<(), CacheError>;

    /// Removes every stale entry, returning how many were removed
    async fn sweep(&self) -> Result<usize, CacheError>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
