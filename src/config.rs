use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public host name, used to build the fallback subtitle URL
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// OpenSubtitles API base URL
    #[serde(default = "default_opensubtitles_api_url")]
    pub opensubtitles_api_url: String,

    /// Upper bound for a single provider request
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Directory holding cached subtitle lists
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// How long a cached subtitle list stays valid
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How often stale cache entries are swept
    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7000
}

fn default_base_domain() -> String {
    "localhost:7000".to_string()
}

fn default_opensubtitles_api_url() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("subtitles")
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_cache_sweep_interval_secs() -> u64 {
    60 * 60
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.provider_timeout_secs == 0 {
            anyhow::bail!("PROVIDER_TIMEOUT_SECS must be greater than zero");
        }
        if self.cache_sweep_interval_secs == 0 {
            anyhow::bail!("CACHE_SWEEP_INTERVAL_SECS must be greater than zero");
        }
        Ok(())
    }

    /// Scheme and host the gateway is reachable at, e.g. `https://subs.example.org`
    ///
    /// Plain http is only used for local development hosts.
    pub fn public_base_url(&self) -> String {
        let protocol = if self.base_domain.contains("localhost") {
            "http"
        } else {
            "https"
        };
        format!("{}://{}", protocol, self.base_domain.trim_end_matches('/'))
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }
}
