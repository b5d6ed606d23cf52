use std::fmt::Display;
use std::num::NonZeroU32;

use crate::error::ParseError;

/// Catalog id plus optional season/episode, parsed from `tt0111161` or `tt0111161:1:5`
///
/// Season and episode are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaIdentifier {
    pub catalog_id: String,
    episode: Option<(NonZeroU32, NonZeroU32)>,
}

impl MediaIdentifier {
    /// Identifier for a title without season/episode (movies, or a degraded series id)
    pub fn from_catalog_id(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            episode: None,
        }
    }

    pub fn with_episode(
        catalog_id: impl Into<String>,
        season: NonZeroU32,
        episode: NonZeroU32,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            episode: Some((season, episode)),
        }
    }

    /// Parses a colon-delimited identifier
    ///
    /// One part yields a catalog id only. Three or more parts yield catalog id,
    /// season and episode; anything after the third part is ignored. Two parts,
    /// or a season/episode that is not a positive integer, is an error.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let catalog_id = parts[0];

        if catalog_id.is_empty() {
            return Err(ParseError::Empty);
        }

        match parts.len() {
            1 => Ok(Self::from_catalog_id(catalog_id)),
            2 => Err(ParseError::MissingEpisode(raw.to_string())),
            _ => {
                let season = parse_number(raw, "season", parts[1])?;
                let episode = parse_number(raw, "episode", parts[2])?;
                Ok(Self::with_episode(catalog_id, season, episode))
            }
        }
    }

    /// Parses `raw`, falling back to the leading catalog id if the season/episode part is malformed
    pub fn parse_lenient(raw: &str) -> Self {
        match Self::parse(raw) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(media_id = %raw, error = %e, "Ignoring season/episode of malformed media id");
                let catalog_id = raw.split(':').next().unwrap_or_default();
                Self::from_catalog_id(catalog_id)
            }
        }
    }

    pub fn season(&self) -> Option<u32> {
        self.episode.map(|(season, _)| season.get())
    }

    pub fn episode(&self) -> Option<u32> {
        self.episode.map(|(_, episode)| episode.get())
    }
}

fn parse_number(raw: &str, field: &'static str, value: &str) -> Result<NonZeroU32, ParseError> {
    value
        .trim()
        .parse::<NonZeroU32>()
        .map_err(|_| ParseError::NotANumber {
            id: raw.to_string(),
            field,
            value: value.to_string(),
        })
}

impl Display for MediaIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.episode {
            Some((season, episode)) => write!(f, "{}:{}:{}", self.catalog_id, season, episode),
            None => write!(f, "{}", self.catalog_id),
        }
    }
}
