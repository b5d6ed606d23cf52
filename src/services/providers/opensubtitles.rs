//! OpenSubtitles provider
//!
//! Looks subtitles up by catalog id (plus season/episode for series) and,
//! when the player supplied them, by video hash and size.
//!
//! API Flow:
//! 1. `GET {api_url}/subtitles/{type}/{catalogId}[:season:episode]?hash=&size=`
//! 2. Response `{"subtitles": [{"id", "url", "lang"}, ...]}` → [`SubtitleTrack`]s

use std::fmt::Display;
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{RequestConfig, SubtitleQuery, SubtitleTrack, DEFAULT_LANGUAGE},
    services::providers::SubtitleProvider,
};

const API_KEY_HEADER: &str = "Api-Key";

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    subtitles: Vec<serde_json::Value>,
}

/// One subtitle as reported by the provider
#[derive(Debug, Deserialize)]
struct ProviderSubtitle {
    id: ProviderSubtitleId,
    url: String,
    #[serde(default)]
    lang: Option<String>,
}

/// Subtitle ids come back as strings or as bare numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderSubtitleId {
    Text(String),
    Number(serde_json::Number),
}

impl Display for ProviderSubtitleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderSubtitleId::Text(id) => write!(f, "{}", id),
            ProviderSubtitleId::Number(id) => write!(f, "{}", id),
        }
    }
}

impl From<ProviderSubtitle> for SubtitleTrack {
    fn from(subtitle: ProviderSubtitle) -> Self {
        let language = subtitle
            .lang
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        SubtitleTrack {
            id: subtitle.id.to_string(),
            url: subtitle.url,
            language,
        }
    }
}

#[derive(Clone)]
pub struct OpenSubtitlesProvider {
    http_client: HttpClient,
    api_url: String,
}

impl OpenSubtitlesProvider {
    /// Creates a provider whose requests give up after `timeout`
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Lookup URL; the `:season:episode` suffix is only added when both are known
    fn subtitles_url(&self, query: &SubtitleQuery) -> String {
        let mut url = format!(
            "{}/subtitles/{}/{}",
            self.api_url,
            urlencoding::encode(&query.media_type),
            urlencoding::encode(&query.media.catalog_id)
        );

        if let (Some(season), Some(episode)) = (query.media.season(), query.media.episode()) {
            url.push_str(&format!(":{}:{}", season, episode));
        }

        url
    }

    /// Query parameters; an empty hash or a zero size counts as not provided
    fn query_params(query: &SubtitleQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(hash) = query.video_hash.as_deref().filter(|hash| !hash.is_empty()) {
            params.push(("hash", hash.to_string()));
        }
        if let Some(size) = query.video_size.filter(|size| *size > 0) {
            params.push(("size", size.to_string()));
        }

        params
    }

    async fn try_fetch(
        &self,
        credentials: &RequestConfig,
        query: &SubtitleQuery,
    ) -> Result<Vec<SubtitleTrack>, ProviderError> {
        let url = self.subtitles_url(query);
        let params = Self::query_params(query);

        let mut request = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &credentials.api_key)
            .header(USER_AGENT, &credentials.app_name)
            .header(ACCEPT, "application/json");

        if !params.is_empty() {
            request = request.query(&params);
        }

        let response = request.send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw OpenSubtitles response");

        let body: ProviderResponse = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let tracks: Vec<SubtitleTrack> = body
            .subtitles
            .into_iter()
            .filter_map(|subtitle| match serde_json::from_value::<ProviderSubtitle>(subtitle) {
                Ok(subtitle) => Some(SubtitleTrack::from(subtitle)),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed subtitle entry");
                    None
                }
            })
            .collect();

        Ok(tracks)
    }
}

#[async_trait::async_trait]
impl SubtitleProvider for OpenSubtitlesProvider {
    async fn fetch_subtitles(
        &self,
        credentials: &RequestConfig,
        query: &SubtitleQuery,
    ) -> Vec<SubtitleTrack> {
        match self.try_fetch(credentials, query).await {
            Ok(tracks) => {
                tracing::info!(
                    media_id = %query.media,
                    media_type = %query.media_type,
                    results = tracks.len(),
                    provider = self.name(),
                    "Subtitle lookup completed"
                );
                tracks
            }
            Err(e) => {
                tracing::warn!(
                    media_id = %query.media,
                    media_type = %query.media_type,
                    provider = self.name(),
                    error = %e,
                    "Subtitle lookup failed, reporting no subtitles"
                );
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "opensubtitles"
    }
}
