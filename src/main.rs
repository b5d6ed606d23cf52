use std::sync::Arc;

use anyhow::Context;
use subtitle_gateway::{
    cache::{spawn_sweeper, DiskCache, SubtitleCache},
    config::Config,
    routes::{create_router, AppState},
    services::{providers::OpenSubtitlesProvider, SubtitleService},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("subtitle_gateway=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;

    let cache: Arc<dyn SubtitleCache> =
        Arc::new(DiskCache::open(config.cache_dir.clone(), config.cache_ttl()).await?);
    let sweeper = spawn_sweeper(cache.clone(), config.cache_sweep_interval());

    let provider =
        OpenSubtitlesProvider::new(&config.opensubtitles_api_url, config.provider_timeout())
            .context("Failed to build provider HTTP client")?;

    let state = Arc::new(AppState::new(
        SubtitleService::new(Arc::new(provider), cache),
        config.public_base_url(),
    ));

    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        address = %address,
        public_url = %config.public_base_url(),
        "Subtitle gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.shutdown().await;
    tracing::info!("Subtitle gateway stopped");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
