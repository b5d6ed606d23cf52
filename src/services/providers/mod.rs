//! Subtitle provider abstraction
//!
//! The gateway fronts a single provider, but the lookup service only sees this
//! trait so tests can substitute a mock and the HTTP client stays swappable.

use crate::models::{RequestConfig, SubtitleQuery, SubtitleTrack};

pub mod opensubtitles;

pub use opensubtitles::OpenSubtitlesProvider;

/// Trait for subtitle providers
///
/// Lookups are best effort: a provider never fails towards its caller. Timeouts,
/// transport errors and bad responses are logged and reported as "no subtitles".
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Fetch the subtitle tracks available for `query`, using the caller's credentials
    async fn fetch_subtitles(
        &self,
        credentials: &RequestConfig,
        query: &SubtitleQuery,
    ) -> Vec<SubtitleTrack>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
