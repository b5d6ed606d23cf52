use std::fmt::Display;

use super::MediaIdentifier;

/// Everything that identifies one subtitle lookup against the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleQuery {
    /// Player content type, e.g. `movie` or `series`
    pub media_type: String,
    pub media: MediaIdentifier,
    pub video_hash: Option<String>,
    pub video_size: Option<u64>,
}

/// Stable cache key of a [`SubtitleQuery`], as 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hashes every query field with BLAKE3
    ///
    /// Each field is written as a presence tag followed by a length-prefixed value,
    /// so an absent field never hashes like an empty one and adjacent fields
    /// cannot bleed into each other.
    pub fn of(query: &SubtitleQuery) -> Self {
        let season = query.media.season().map(u32::to_be_bytes);
        let episode = query.media.episode().map(u32::to_be_bytes);
        let video_size = query.video_size.map(u64::to_be_bytes);

        let mut hasher = blake3::Hasher::new();
        write_field(&mut hasher, Some(query.media_type.as_bytes()));
        write_field(&mut hasher, Some(query.media.catalog_id.as_bytes()));
        write_field(&mut hasher, season.as_ref().map(|b| b.as_slice()));
        write_field(&mut hasher, episode.as_ref().map(|b| b.as_slice()));
        write_field(&mut hasher, query.video_hash.as_deref().map(str::as_bytes));
        write_field(&mut hasher, video_size.as_ref().map(|b| b.as_slice()));
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Accepts a previously rendered fingerprint, e.g. a cache file stem
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn write_field(hasher: &mut blake3::Hasher, value: Option<&[u8]>) {
    match value {
        None => {
            hasher.update(&[0]);
        }
        Some(bytes) => {
            hasher.update(&[1]);
            hasher.update(&(bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        }
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
