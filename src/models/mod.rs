use serde::{Deserialize, Serialize};

pub mod fingerprint;
pub mod manifest;
pub mod media_id;
pub mod request_config;

pub use fingerprint::{Fingerprint, SubtitleQuery};
pub use manifest::Manifest;
pub use media_id::MediaIdentifier;
pub use request_config::RequestConfig;

/// Language assumed when the provider does not report one
pub const DEFAULT_LANGUAGE: &str = "eng";

/// A single subtitle track as understood by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub id: String,
    pub url: String,
    #[serde(rename = "lang", default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Body of every subtitle endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitlesResponse {
    pub subtitles: Vec<SubtitleTrack>,
}

impl SubtitlesResponse {
    /// No subtitles, used whenever a lookup degrades softly
    pub fn empty() -> Self {
        Self {
            subtitles: Vec::new(),
        }
    }

    /// Tracks found for `media_id`, with ids namespaced as `{media_id}-{track_id}`
    pub fn for_media(media_id: &str, tracks: Vec<SubtitleTrack>) -> Self {
        let subtitles = tracks
            .into_iter()
            .map(|track| SubtitleTrack {
                id: format!("{}-{}", media_id, track.id),
                ..track
            })
            .collect();

        Self { subtitles }
    }

    /// Single placeholder track pointing at the static loading subtitle
    pub fn fallback(public_base_url: &str) -> Self {
        Self {
            subtitles: vec![SubtitleTrack {
                id: "loading".to_string(),
                url: format!("{}/loading.srt", public_base_url),
                language: DEFAULT_LANGUAGE.to_string(),
            }],
        }
    }
}
