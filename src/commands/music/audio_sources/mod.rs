//! This module defines the collaborators the queue engine consumes: a `Resolver`
//! that turns search text or a catalog entry into a playable `Track`, and
//! `CatalogPlaylistReader`s that list the entries of a YouTube or Spotify
//! playlist lazily, page by page.

/// Cursor-driven pagination shared by the catalog readers.
pub mod pagination;
/// Spotify Web API playlist reader.
pub mod spotify;
/// `Track` and `CatalogEntry` value types.
pub mod track_metadata;
/// yt-dlp resolver and YouTube Data API playlist reader.
pub mod youtube;

use futures::stream::BoxStream;
use regex::Regex;
use serenity::async_trait;
use std::fmt;
use std::sync::LazyLock;

use crate::commands::music::utils::music_manager::MusicResult;

pub use pagination::{CatalogPage, paginate};
pub use track_metadata::{CatalogEntry, Track};

/// Captures the playlist id from the `list=` query parameter of a YouTube URL.
static YOUTUBE_PLAYLIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/.*[?&]list=([^&#]+)").unwrap()
});

/// Captures the playlist id from a Spotify playlist URL.
static SPOTIFY_PLAYLIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:open\.spotify\.com|spotify\.com)/playlist/([a-zA-Z0-9]+)")
        .unwrap()
});

/// Turns user input or catalog entries into playable tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves free text (or a direct link) to the best matching track.
    async fn resolve_search(&self, query: &str) -> MusicResult<Track>;

    /// Resolves one entry of a catalog playlist.
    async fn resolve_catalog_entry(&self, entry: &CatalogEntry) -> MusicResult<Track>;
}

/// Lists the tracks of a catalog playlist.
pub trait CatalogPlaylistReader: Send + Sync {
    /// Returns a lazy stream of at most `max_items` entries, in catalog order.
    /// Pages are fetched only as the stream is consumed. A failed page fetch is
    /// yielded as the last item.
    fn list_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
        max_items: usize,
    ) -> BoxStream<'a, MusicResult<CatalogEntry>>;
}

/// The catalogs a playlist URL can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistSource {
    YouTube,
    Spotify,
}

impl PlaylistSource {
    /// Detects the catalog of a playlist URL and extracts its playlist id.
    pub fn parse(url: &str) -> Option<(PlaylistSource, String)> {
        let url = url.trim();
        if let Some(captures) = YOUTUBE_PLAYLIST_REGEX.captures(url) {
            return Some((PlaylistSource::YouTube, captures[1].to_string()));
        }
        SPOTIFY_PLAYLIST_REGEX
            .captures(url)
            .map(|captures| (PlaylistSource::Spotify, captures[1].to_string()))
    }
}

impl fmt::Display for PlaylistSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistSource::YouTube => write!(f, "YouTube"),
            PlaylistSource::Spotify => write!(f, "Spotify"),
        }
    }
}
