//! Runtime configuration, read from the environment (and `.env` via `dotenv`).

use std::env;
use std::time::Duration;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

const DEFAULT_PREFIX: &str = "/.";
const DEFAULT_PLAYLIST_MAX_ITEMS: usize = 25;
const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_QUEUE_PAGE_SIZE: usize = 10;

/// Client credentials for the Spotify Web API.
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    /// YouTube Data API key; YouTube playlists are unavailable without it.
    pub youtube_api_key: Option<String>,
    /// Spotify playlists are unavailable without credentials.
    pub spotify: Option<SpotifyCredentials>,
    /// Pending tracks allowed per session. `None` means unbounded.
    pub max_queue_length: Option<usize>,
    pub playlist_max_items: usize,
    pub resolve_timeout: Duration,
    pub queue_page_size: usize,
    pub ytdlp_path: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("command_prefix", &self.command_prefix)
            .field("youtube_api_key", &self.youtube_api_key.as_ref().map(|_| "<redacted>"))
            .field("spotify", &self.spotify)
            .field("max_queue_length", &self.max_queue_length)
            .field("playlist_max_items", &self.playlist_max_items)
            .field("resolve_timeout", &self.resolve_timeout)
            .field("queue_page_size", &self.queue_page_size)
            .field("ytdlp_path", &self.ytdlp_path)
            .finish()
    }
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> MusicResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MusicResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        // Legacy variable names are read as fallbacks.
        let discord_token = get("DISCORD_TOKEN")
            .or_else(|| get("DISCORD_BOT_TOKEN"))
            .ok_or_else(|| MusicError::ConfigError("DISCORD_TOKEN not set".to_string()))?;

        let spotify_id = get("SPOTIFY_CLIENT_ID").or_else(|| get("SPOTIPY_CLIENT_ID"));
        let spotify_secret = get("SPOTIFY_CLIENT_SECRET").or_else(|| get("SPOTIPY_CLIENT_SECRET"));
        let spotify = match (spotify_id, spotify_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => {
                return Err(MusicError::ConfigError(
                    "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set together".to_string(),
                ));
            }
        };

        let max_queue_length = get("MAX_QUEUE_LENGTH")
            .map(|value| parse_positive("MAX_QUEUE_LENGTH", &value))
            .transpose()?;

        let playlist_max_items = get("PLAYLIST_MAX_ITEMS")
            .map(|value| parse_positive("PLAYLIST_MAX_ITEMS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_PLAYLIST_MAX_ITEMS);

        let resolve_timeout_secs = get("RESOLVE_TIMEOUT_SECS")
            .map(|value| parse_positive("RESOLVE_TIMEOUT_SECS", &value))
            .transpose()?
            .map_or(DEFAULT_RESOLVE_TIMEOUT_SECS, |secs| secs as u64);

        let queue_page_size = get("QUEUE_PAGE_SIZE")
            .map(|value| parse_positive("QUEUE_PAGE_SIZE", &value))
            .transpose()?
            .unwrap_or(DEFAULT_QUEUE_PAGE_SIZE);

        Ok(Config {
            discord_token,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            youtube_api_key: get("YOUTUBE_API_KEY").or_else(|| get("API_KEY")),
            spotify,
            max_queue_length,
            playlist_max_items,
            resolve_timeout: Duration::from_secs(resolve_timeout_secs),
            queue_page_size,
            ytdlp_path: get("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
        })
    }
}

fn parse_positive(key: &str, value: &str) -> MusicResult<usize> {
    match value.parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(MusicError::ConfigError(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))),
    }
}
