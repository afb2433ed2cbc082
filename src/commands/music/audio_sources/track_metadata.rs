//! Defines `Track`, the playable unit handed to the queue engine, and
//! `CatalogEntry`, the unresolved item returned by a catalog playlist reader.

use serde::Deserialize;
use std::time::Duration;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// A resolved, playable track.
///
/// `media_ref` is an opaque locator the playback sink knows how to stream.
/// `title` and `duration` are display-only and never used for identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    media_ref: String,
    title: String,
    duration: Option<Duration>,
}

impl Track {
    pub fn new(media_ref: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_ref: media_ref.into(),
            title: title.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn media_ref(&self) -> &str {
        &self.media_ref
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Builds a `Track` from `yt-dlp -j` output.
    ///
    /// Only the first JSON line is considered (a `ytsearch1:` query prints one
    /// line per hit). Empty output means the extractor found nothing.
    pub fn from_ytdlp_json(output: &str) -> MusicResult<Track> {
        let line = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| MusicError::NotFound("yt-dlp returned no results".to_string()))?;

        let info: YtDlpInfo = serde_json::from_str(line).map_err(|e| {
            MusicError::AudioSourceError(format!("Failed to parse video metadata: {}", e))
        })?;

        // Prefer the watch page: stream URLs expire, the page can be re-extracted at play time.
        let media_ref = info
            .webpage_url
            .or(info.url)
            .ok_or_else(|| MusicError::NotFound("yt-dlp result has no playable URL".to_string()))?;

        let track = Track {
            media_ref,
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            duration: info
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
        };

        Ok(track)
    }
}

/// The subset of `yt-dlp --dump-json` fields we care about.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
}

/// One item of a catalog playlist, before it has been resolved to a `Track`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogEntry {
    /// Catalog-specific identifier (YouTube video id, Spotify track id).
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    /// Set when the entry can be fetched directly instead of searched for.
    pub direct_url: Option<String>,
}

impl CatalogEntry {
    /// Search text used when the entry has no direct URL,
    /// e.g. "Track Name by Artist1, Artist2 audio".
    pub fn search_query(&self) -> String {
        if self.artists.is_empty() {
            self.title.clone()
        } else {
            format!("{} by {} audio", self.title, self.artists.join(", "))
        }
    }

    /// Human-readable label for notices about this entry.
    pub fn label(&self) -> String {
        if self.artists.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artists.join(", "), self.title)
        }
    }
}
