pub mod providers;
pub mod subtitles;

pub use subtitles::SubtitleService;
