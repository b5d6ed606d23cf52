use std::sync::Arc;

use crate::{
    cache::SubtitleCache,
    models::{Fingerprint, RequestConfig, SubtitleQuery, SubtitleTrack},
    services::providers::SubtitleProvider,
};

/// Cache-first subtitle lookup
///
/// Checks the cache for the query's fingerprint, falls back to the provider on a
/// miss and stores non-empty provider results. Cache failures are logged and
/// treated as misses, so this never fails.
#[derive(Clone)]
pub struct SubtitleService {
    provider: Arc<dyn SubtitleProvider>,
    cache: Arc<dyn SubtitleCache>,
}

impl SubtitleService {
    pub fn new(provider: Arc<dyn SubtitleProvider>, cache: Arc<dyn SubtitleCache>) -> Self {
        Self { provider, cache }
    }

    pub async fn find_subtitles(
        &self,
        credentials: &RequestConfig,
        query: &SubtitleQuery,
    ) -> Vec<SubtitleTrack> {
        let fingerprint = Fingerprint::of(query);

        match self.cache.get(&fingerprint).await {
            Ok(Some(entry)) => {
                tracing::debug!(
                    fingerprint = %fingerprint,
                    media_id = %query.media,
                    tracks = entry.tracks.len(),
                    "Cache hit"
                );
                return entry.tracks;
            }
            Ok(None) => {
                tracing::debug!(fingerprint = %fingerprint, media_id = %query.media, "Cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    cache = self.cache.name(),
                    error = %e,
                    "Cache read failed, treating as miss"
                );
            }
        }

        let tracks = self.provider.fetch_subtitles(credentials, query).await;

        // An empty list may just be a provider outage; don't pin it for the whole TTL
        if tracks.is_empty() {
            return tracks;
        }

        if let Err(e) = self.cache.put(&fingerprint, &tracks).await {
            tracing::warn!(
                fingerprint = %fingerprint,
                cache = self.cache.name(),
                error = %e,
                "Failed to store subtitles in cache"
            );
        }

        tracks
    }
}
