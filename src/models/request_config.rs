//! Per-request add-on configuration
//!
//! Players embed the user's settings in the first path segment as base64-encoded
//! JSON, e.g. `{"opensubtitles_key":"...","opensubtitles_app":"MyApp"}`.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::Deserialize;

use crate::error::ConfigError;

/// User agent sent to the provider when the config names no application
pub const DEFAULT_APP_NAME: &str = "Stremio AI Translator";

/// URL-safe alphabet, padding optional. Standard-alphabet input is mapped onto it first.
const CONFIG_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Provider credentials decoded from the request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub api_key: String,
    pub app_name: String,
}

/// Wire shape of the config blob. Fields this gateway does not use are ignored.
#[derive(Debug, Deserialize)]
struct RawRequestConfig {
    #[serde(default)]
    opensubtitles_key: Option<String>,
    #[serde(default)]
    opensubtitles_app: Option<String>,
}

impl RequestConfig {
    /// Decodes a base64 (URL-safe or standard, padded or not) JSON config blob
    ///
    /// A missing, null, empty or whitespace-only `opensubtitles_key` is rejected.
    pub fn decode(encoded: &str) -> Result<Self, ConfigError> {
        let normalized: String = encoded
            .trim()
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        let bytes = CONFIG_ENGINE.decode(normalized.as_bytes())?;
        let text = String::from_utf8(bytes)?;
        let raw: RawRequestConfig = serde_json::from_str(&text)?;

        let api_key = raw
            .opensubtitles_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let app_name = raw
            .opensubtitles_app
            .filter(|app| !app.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        Ok(Self { api_key, app_name })
    }
}
