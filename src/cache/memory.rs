use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{CacheEntry, SubtitleCache};
use crate::error::CacheError;
use crate::models::{Fingerprint, SubtitleTrack};

/// In-process subtitle cache with the same TTL rules as [`super::DiskCache`]
///
/// Nothing survives a restart. Useful for tests and single-shot deployments.
pub struct MemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SubtitleCache for MemoryCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(fingerprint) {
                None => return Ok(None),
                Some(entry) if entry.is_fresh(Utc::now(), self.ttl) => {
                    return Ok(Some(entry.clone()))
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock, a concurrent put may have refreshed it
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        match entries.get(fingerprint) {
            Some(entry) if entry.is_fresh(now, self.ttl) => Ok(Some(entry.clone())),
            Some(_) => {
                entries.remove(fingerprint);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        fingerprint: &Fingerprint,
        tracks: &[SubtitleTrack],
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(fingerprint, tracks.to_vec());
        self.entries.write().await.insert(fingerprint.clone(), entry);
        Ok(())
    }

    async fn sweep(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        Ok(before - entries.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
