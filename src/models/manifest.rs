use serde::Serialize;

/// Add-on manifest served to players at `/manifest.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub resources: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub catalogs: Vec<serde_json::Value>,
    pub id_prefixes: Vec<&'static str>,
    pub behavior_hints: BehaviorHints,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub configurable: bool,
    pub configuration_required: bool,
}

impl Manifest {
    /// Manifest for an install that does (`configured`) or does not yet carry a valid config
    pub fn new(configured: bool) -> Self {
        Self {
            id: "org.stremio.subtitlegateway",
            version: env!("CARGO_PKG_VERSION"),
            name: "Subtitle Gateway",
            description: "Subtitles from OpenSubtitles for movies and series",
            resources: vec!["subtitles"],
            types: vec!["movie", "series"],
            catalogs: Vec::new(),
            id_prefixes: vec!["tt"],
            behavior_hints: BehaviorHints {
                configurable: true,
                configuration_required: !configured,
            },
        }
    }
}
