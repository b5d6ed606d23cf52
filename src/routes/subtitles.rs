//! Subtitle resource handler
//!
//! `GET /{config}/subtitles/{type}/{id}.json` and
//! `GET /{config}/subtitles/{type}/{id}/{extra}.json`, where `extra` is
//! `videoHash=...&videoSize=...` (percent-encoded, other keys ignored).
//!
//! Failure policy: an undecodable config answers `{"subtitles": []}` with 200;
//! anything unexpected answers a single placeholder subtitle with 500. Players
//! render those two cases differently.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult, ConfigError},
    middleware::RequestId,
    models::{MediaIdentifier, RequestConfig, SubtitleQuery, SubtitleTrack, SubtitlesResponse},
    routes::AppState,
};

const JSON_SUFFIX: &str = ".json";

/// Served at `/loading.srt`, the target of the fallback subtitle
const LOADING_SUBTITLE: &str = "1\n00:00:00,000 --> 00:00:10,000\nLoading subtitles, please try again in a moment.\n";

#[derive(Debug, Deserialize)]
pub struct SubtitlePath {
    config: String,
    media_type: String,
    id: String,
}

/// A subtitle request as received, before any decoding
#[derive(Debug, Clone)]
struct SubtitleRequest {
    config: String,
    media_type: String,
    media_id: String,
    extra: Option<String>,
}

/// Video fingerprint the player sends along, used for exact-release matches
#[derive(Debug, Default, PartialEq, Eq)]
struct VideoExtra {
    video_hash: Option<String>,
    video_size: Option<u64>,
}

impl VideoExtra {
    /// Parses `videoHash=...&videoSize=...` from a raw (still percent-encoded) path segment
    ///
    /// Empty values count as absent. A `videoSize` that is not a number is an invalid request.
    fn parse(raw_segment: &str) -> AppResult<Self> {
        let raw = raw_segment.strip_suffix(JSON_SUFFIX).unwrap_or(raw_segment);
        let mut extra = VideoExtra::default();

        for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value)
                .map_err(|e| AppError::InvalidRequest(format!("Extra '{}' is not valid UTF-8: {}", key, e)))?;

            match key {
                "videoHash" if !value.is_empty() => extra.video_hash = Some(value.into_owned()),
                "videoSize" if !value.is_empty() => {
                    let size = value.parse::<u64>().map_err(|_| {
                        AppError::InvalidRequest(format!("videoSize '{}' is not a number", value))
                    })?;
                    extra.video_size = Some(size);
                }
                _ => {}
            }
        }

        Ok(extra)
    }
}

/// Subtitles for a title without extra arguments
pub async fn get_subtitles(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<SubtitlePath>, PathRejection>,
    uri: Uri,
) -> (StatusCode, Json<SubtitlesResponse>) {
    let path = match path {
        Ok(Path(path)) => path,
        Err(rejection) => return undecodable_path(&state, request_id, &uri, rejection),
    };
    let media_id = strip_json_suffix(&path.id);

    respond(
        state,
        request_id,
        SubtitleRequest {
            config: path.config,
            media_type: path.media_type,
            media_id,
            extra: None,
        },
    )
    .await
}

/// Subtitles for a title, with the player's `videoHash`/`videoSize` extra arguments
pub async fn get_subtitles_with_extra(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<SubtitlePath>, PathRejection>,
    uri: Uri,
) -> (StatusCode, Json<SubtitlesResponse>) {
    let path = match path {
        Ok(Path(path)) => path,
        Err(rejection) => return undecodable_path(&state, request_id, &uri, rejection),
    };
    // Path params arrive percent-decoded, which would split values containing '&'
    let extra = uri.path().rsplit('/').next().unwrap_or_default().to_string();

    respond(
        state,
        request_id,
        SubtitleRequest {
            config: path.config,
            media_type: path.media_type,
            media_id: path.id,
            extra: Some(extra),
        },
    )
    .await
}

/// Static placeholder subtitle
pub async fn loading_subtitle() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/x-subrip; charset=utf-8")],
        LOADING_SUBTITLE,
    )
}

/// Runs the lookup and maps its outcome onto the player-facing response
async fn respond(
    state: Arc<AppState>,
    request_id: RequestId,
    request: SubtitleRequest,
) -> (StatusCode, Json<SubtitlesResponse>) {
    let media_id = request.media_id.clone();

    tracing::info!(
        request_id = %request_id,
        media_type = %request.media_type,
        media_id = %media_id,
        "Processing subtitle request"
    );

    let outcome = resolve(state.clone(), request).await;
    finish(&state, request_id, &media_id, outcome)
}

/// Answers a request whose path segments are not valid UTF-8 once percent-decoded
///
/// Judged in lookup order: an unusable config segment soft-degrades, anything
/// else gets the placeholder.
fn undecodable_path(
    state: &AppState,
    request_id: RequestId,
    uri: &Uri,
    rejection: PathRejection,
) -> (StatusCode, Json<SubtitlesResponse>) {
    let raw_config = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    let error = match urlencoding::decode(raw_config) {
        Err(e) => AppError::Config(ConfigError::Utf8(e)),
        Ok(config) => match RequestConfig::decode(&config) {
            Err(e) => AppError::Config(e),
            Ok(_) => AppError::InvalidRequest(format!("Undecodable path: {}", rejection)),
        },
    };

    finish(state, request_id, "", Err(error))
}

fn finish(
    state: &AppState,
    request_id: RequestId,
    media_id: &str,
    outcome: AppResult<Vec<SubtitleTrack>>,
) -> (StatusCode, Json<SubtitlesResponse>) {
    match outcome {
        Ok(tracks) => {
            tracing::info!(
                request_id = %request_id,
                media_id = %media_id,
                count = tracks.len(),
                "Subtitle request completed"
            );
            (
                StatusCode::OK,
                Json(SubtitlesResponse::for_media(media_id, tracks)),
            )
        }
        Err(e) if e.is_soft() => {
            tracing::info!(
                request_id = %request_id,
                error = %e,
                "No usable config, answering with no subtitles"
            );
            (StatusCode::OK, Json(SubtitlesResponse::empty()))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                media_id = %media_id,
                error = %e,
                "Subtitle request failed, answering with placeholder"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubtitlesResponse::fallback(&state.public_base_url)),
            )
        }
    }
}

/// Runs the lookup on its own task so a panic anywhere in it becomes an [`AppError`]
async fn resolve(state: Arc<AppState>, request: SubtitleRequest) -> AppResult<Vec<SubtitleTrack>> {
    tokio::spawn(lookup(state, request)).await?
}

async fn lookup(state: Arc<AppState>, request: SubtitleRequest) -> AppResult<Vec<SubtitleTrack>> {
    let credentials = RequestConfig::decode(&request.config)?;

    let extra = match request.extra.as_deref() {
        Some(raw) => VideoExtra::parse(raw)?,
        None => VideoExtra::default(),
    };

    let query = SubtitleQuery {
        media_type: request.media_type,
        media: MediaIdentifier::parse_lenient(&request.media_id),
        video_hash: extra.video_hash,
        video_size: extra.video_size,
    };

    Ok(state.subtitles.find_subtitles(&credentials, &query).await)
}

fn strip_json_suffix(segment: &str) -> String {
    segment
        .strip_suffix(JSON_SUFFIX)
        .unwrap_or(segment)
        .to_string()
}
