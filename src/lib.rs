//! woki-dj: a Discord voice-channel music bot.
//!
//! Users queue tracks from YouTube searches or from YouTube and Spotify
//! playlists; each guild gets its own playback session that streams the queue
//! into a voice channel one track at a time.

pub mod commands;
pub mod config;

use std::sync::Arc;

use commands::music::audio_sources::{
    CatalogPlaylistReader, Resolver,
    spotify::SpotifyPlaylistReader,
    youtube::{YoutubePlaylistReader, YtDlpResolver},
};
use commands::music::utils::session::SessionRegistry;
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared state, accessible in all command invocations.
pub struct Data {
    pub config: Config,
    /// Shared by the catalog readers and songbird's inputs.
    pub http_client: reqwest::Client,
    pub resolver: Arc<dyn Resolver>,
    pub youtube: Option<Arc<dyn CatalogPlaylistReader>>,
    pub spotify: Option<Arc<dyn CatalogPlaylistReader>>,
    pub sessions: Arc<SessionRegistry>,
}

impl Data {
    /// Builds the collaborators described by `config`. Catalogs without
    /// credentials are left out.
    pub fn new(config: Config) -> Self {
        let http_client = reqwest::Client::new();

        let youtube = config.youtube_api_key.as_ref().map(|key| {
            Arc::new(YoutubePlaylistReader::new(http_client.clone(), key.clone()))
                as Arc<dyn CatalogPlaylistReader>
        });
        let spotify = config.spotify.as_ref().map(|credentials| {
            Arc::new(SpotifyPlaylistReader::new(
                http_client.clone(),
                credentials.clone(),
            )) as Arc<dyn CatalogPlaylistReader>
        });

        Self {
            resolver: Arc::new(YtDlpResolver::new(
                config.ytdlp_path.clone(),
                config.resolve_timeout,
            )),
            youtube,
            spotify,
            http_client,
            sessions: Arc::new(SessionRegistry::new()),
            config,
        }
    }
}

/// Show help for all commands or for one of them
#[poise::command(
    prefix_command,
    slash_command,
    aliases("wokihelp"),
    category = "General"
)]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Every command the bot serves.
/// Presence text shown under the bot's name.
pub fn status_line(prefix: &str) -> String {
    format!("Type '{}help' to see the list of commands 😊", prefix)
}

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    use commands::music::{
        clear::*, leave::*, play::*, playlist::*, queue::*, shuffle::*, skip::*,
    };

    vec![
        // Default commands
        register(),
        help(),
        // Music commands
        play(),
        playlist(),
        skip(),
        queue(),
        clear(),
        shuffle(),
        leave(),
    ]
}
