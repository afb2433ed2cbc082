//! YouTube collaborators: `YtDlpResolver` resolves searches and catalog entries
//! through the `yt-dlp` command-line tool, `YoutubePlaylistReader` lists
//! playlist items through the YouTube Data API v3.

use futures::stream::BoxStream;
use serde::Deserialize;
use serenity::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{CatalogEntry, CatalogPage, CatalogPlaylistReader, Resolver, Track, paginate};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// Public endpoint of the YouTube Data API.
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page the `playlistItems` endpoint will serve.
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Resolves queries by shelling out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: String,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Runs `yt-dlp` against a URL or `ytsearch1:` target and parses the first result.
    async fn extract(&self, target: &str) -> MusicResult<Track> {
        debug!("Running {} for target: {}", self.binary, target);

        let mut command = Command::new(&self.binary);
        command
            .args([
                "-j",            // Output as JSON
                "--no-playlist", // Don't process playlists
                "-f",
                "bestaudio/best",
                target,
            ])
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| MusicError::ResolveTimeout(self.timeout))?
            .map_err(|e| {
                MusicError::AudioSourceError(format!("Failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp failed for {}: {}", target, stderr.trim());
            return Err(MusicError::NotFound(target.to_string()));
        }

        Track::from_ytdlp_json(&String::from_utf8_lossy(&output.stdout)).map_err(|err| match err {
            MusicError::NotFound(_) => MusicError::NotFound(target.to_string()),
            other => other,
        })
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve_search(&self, query: &str) -> MusicResult<Track> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MusicError::NotFound(String::new()));
        }
        info!("Resolving search: {}", query);

        // Links go straight to the extractor, anything else is a search.
        let target = if url::Url::parse(query).is_ok() {
            query.to_string()
        } else {
            format!("ytsearch1:{}", query)
        };

        self.extract(&target).await.map_err(|err| match err {
            MusicError::NotFound(_) => MusicError::NotFound(query.to_string()),
            other => other,
        })
    }

    async fn resolve_catalog_entry(&self, entry: &CatalogEntry) -> MusicResult<Track> {
        let result = match &entry.direct_url {
            Some(url) => self.extract(url).await,
            None => self.extract(&format!("ytsearch1:{}", entry.search_query())).await,
        };

        result.map_err(|err| match err {
            MusicError::NotFound(_) => MusicError::NotFound(entry.label()),
            other => other,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    #[serde(default)]
    video_owner_channel_title: Option<String>,
    #[serde(default)]
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

impl From<PlaylistItem> for CatalogEntry {
    fn from(item: PlaylistItem) -> Self {
        let snippet = item.snippet;
        let video_id = snippet.resource_id.and_then(|r| r.video_id);

        CatalogEntry {
            direct_url: video_id
                .as_ref()
                .map(|id| format!("https://www.youtube.com/watch?v={}", id)),
            id: video_id.unwrap_or_default(),
            title: snippet.title,
            artists: snippet.video_owner_channel_title.into_iter().collect(),
        }
    }
}

/// Lists playlist items through the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YoutubePlaylistReader {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubePlaylistReader {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
        }
    }

    /// Points the reader at another API host (used against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> MusicResult<CatalogPage> {
        let url = format!("{}/playlistItems", self.base_url);
        let page_size = PLAYLIST_PAGE_SIZE.to_string();

        let mut request = self.client.get(&url).query(&[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("key", self.api_key.as_str()),
            ("maxResults", page_size.as_str()),
        ]);
        if let Some(token) = &page_token {
            request = request.query(&[("pageToken", token.as_str())]);
        }

        let response = request.send().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to request YouTube playlist: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "YouTube API error: {} - {}",
                status, text
            )));
        }

        let page: PlaylistItemsPage = response.json().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse YouTube playlist data: {}", e))
        })?;

        debug!(
            "YouTube playlist {} page returned {} items",
            playlist_id,
            page.items.len()
        );

        Ok(CatalogPage {
            entries: page.items.into_iter().map(CatalogEntry::from).collect(),
            next_cursor: page.next_page_token,
        })
    }
}

impl CatalogPlaylistReader for YoutubePlaylistReader {
    fn list_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
        max_items: usize,
    ) -> BoxStream<'a, MusicResult<CatalogEntry>> {
        info!(
            "Listing YouTube playlist {} (max {} items)",
            playlist_id, max_items
        );
        paginate(max_items, move |cursor| self.fetch_page(playlist_id, cursor))
    }
}
