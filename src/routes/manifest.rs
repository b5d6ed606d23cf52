use axum::{
    extract::{rejection::PathRejection, Path},
    Json,
};

use crate::models::{Manifest, RequestConfig};

/// Manifest for a fresh install, asking the player to configure the add-on
pub async fn manifest() -> Json<Manifest> {
    Json(Manifest::new(false))
}

/// Manifest for an install URL that already embeds a config
pub async fn configured_manifest(
    config: Result<Path<String>, PathRejection>,
) -> Json<Manifest> {
    let decoded = match config {
        Ok(Path(config)) => RequestConfig::decode(&config).map_err(|e| e.to_string()),
        Err(rejection) => Err(rejection.body_text()),
    };

    if let Err(e) = &decoded {
        tracing::debug!(error = %e, "Manifest requested with unusable config");
    }

    Json(Manifest::new(decoded.is_ok()))
}
