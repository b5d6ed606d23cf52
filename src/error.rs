use std::path::PathBuf;

/// Failures decoding the base64 configuration blob embedded in the request path
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Config is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Config is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config has no OpenSubtitles API key")]
    MissingApiKey,
}

/// Failures parsing a `catalogId[:season:episode]` media identifier
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Media id is empty")]
    Empty,

    #[error("Media id '{0}' has a season but no episode")]
    MissingEpisode(String),

    #[error("Media id '{id}' has a non-numeric {field}: '{value}'")]
    NotANumber {
        id: String,
        field: &'static str,
        value: String,
    },
}

/// Failures talking to the subtitle provider
///
/// Never surfaced to callers of a provider; logged and turned into an empty result.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("Provider request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("Provider transport error: {0}")]
    Transport(reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Provider response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(e)
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e)
        }
    }
}

/// Failures of the subtitle cache store
///
/// Treated as a cache miss (or a skipped write) by the lookup service.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove cache file {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize cache entry: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors that reach the subtitle request handler
///
/// `Config` is the expected "no usable config" case and soft-degrades to an
/// empty subtitle list. Every other variant is unexpected and produces the
/// placeholder subtitle with a 500.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error should be answered with an empty list rather than the fallback
    pub fn is_soft(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Subtitle lookup task failed: {}", e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
