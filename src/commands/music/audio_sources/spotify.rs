//! Implements `CatalogPlaylistReader` for Spotify playlists.
//! Handles authentication (client credentials flow) and cursor pagination.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use futures::stream::BoxStream;
use reqwest::header;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{CatalogEntry, CatalogPage, CatalogPlaylistReader, paginate};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::config::SpotifyCredentials;

/// Public endpoint of the Spotify accounts service.
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
/// Public endpoint of the Spotify Web API.
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Represents the response from Spotify's token endpoint.
#[derive(Debug, Deserialize)]
struct SpotifyToken {
    /// The OAuth2 access token.
    access_token: String,
    /// The duration in seconds for which the token is valid.
    expires_in: u64,
    /// The time when the token was created, used to check expiry.
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    /// Checks if the token has expired or is close to expiring.
    /// Considers the token expired 30 seconds before its actual expiry time.
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        let elapsed = self.created_at.elapsed();
        elapsed > expiry.saturating_sub(Duration::from_secs(30))
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistTrackItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrackItem {
    track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

impl SpotifyTrack {
    /// Local files and unavailable items come back without an id.
    fn into_entry(self) -> Option<CatalogEntry> {
        let id = self.id?;
        Some(CatalogEntry {
            id,
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            direct_url: None,
        })
    }
}

/// Lists the tracks of a Spotify playlist through the Web API.
pub struct SpotifyPlaylistReader {
    client: reqwest::Client,
    credentials: SpotifyCredentials,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<SpotifyToken>>,
}

impl SpotifyPlaylistReader {
    pub fn new(client: reqwest::Client, credentials: SpotifyCredentials) -> Self {
        Self {
            client,
            credentials,
            accounts_url: SPOTIFY_ACCOUNTS_URL.to_string(),
            api_url: SPOTIFY_API_URL.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Points the reader at other hosts (used against mock servers).
    pub fn with_base_urls(
        mut self,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        self.accounts_url = accounts_url.into().trim_end_matches('/').to_string();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns a valid access token, requesting a new one if the cached one is
    /// missing or about to expire.
    async fn access_token(&self) -> MusicResult<String> {
        let mut token_lock = self.token.lock().await;

        if let Some(token) = &*token_lock {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting a new Spotify access token");

        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        let token = response.json::<SpotifyToken>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify token: {}", e))
        })?;

        let access_token = token.access_token.clone();
        *token_lock = Some(token);

        Ok(access_token)
    }

    /// Fetches one page of playlist tracks. `next_url` is the `next` link of
    /// the previous page; `None` requests the first page.
    async fn fetch_page(
        &self,
        playlist_id: &str,
        next_url: Option<String>,
    ) -> MusicResult<CatalogPage> {
        let token = self.access_token().await?;
        let url = next_url.unwrap_or_else(|| {
            format!("{}/playlists/{}/tracks?limit=50", self.api_url, playlist_id)
        });

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify playlist: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        let page: PlaylistTracksPage = response.json().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify playlist data: {}", e))
        })?;

        debug!(
            "Spotify playlist {} page returned {} items",
            playlist_id,
            page.items.len()
        );

        Ok(page_to_catalog(page))
    }
}

fn page_to_catalog(page: PlaylistTracksPage) -> CatalogPage {
    CatalogPage {
        entries: page
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(SpotifyTrack::into_entry))
            .collect(),
        next_cursor: page.next,
    }
}

impl CatalogPlaylistReader for SpotifyPlaylistReader {
    fn list_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
        max_items: usize,
    ) -> BoxStream<'a, MusicResult<CatalogEntry>> {
        info!(
            "Listing Spotify playlist {} (max {} items)",
            playlist_id, max_items
        );
        paginate(max_items, move |cursor| self.fetch_page(playlist_id, cursor))
    }
}
