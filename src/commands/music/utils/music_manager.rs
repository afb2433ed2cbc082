use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::{Call, CoreEvent, Event, Songbird};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::embedded_messages;
use super::event_handlers::VoiceDisconnectNotifier;
use super::session::{SessionHandle, SessionRegistry};
use super::songbird_sink::SongbirdSink;
use crate::Data;

/// Errors that can occur during music operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No results found for: {0}")]
    NotFound(String),

    #[error("Resolving the track took longer than {0:?}")]
    ResolveTimeout(Duration),

    #[error("No song is currently playing")]
    NotPlaying,

    #[error("The queue is currently empty")]
    EmptyQueue,

    #[error("The queue is full ({0} tracks)")]
    QueueFull(usize),

    #[error("Failed to start playback: {0}")]
    SinkStart(String),

    #[error("Playback control failed: {0}")]
    PlaybackControl(String),

    #[error("Not a YouTube or Spotify playlist URL: {0}")]
    InvalidPlaylistUrl(String),

    #[error("The playback session has been closed")]
    SessionClosed,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// State of a guild's songbird call as far as playback is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceLink {
    /// Songbird has no call for the guild.
    Missing,
    /// The call outlived its connection (kick, network drop).
    Disconnected,
    Connected,
}

impl VoiceLink {
    pub fn of(call: Option<&Call>) -> Self {
        match call {
            None => Self::Missing,
            Some(call) if call.current_channel().is_none() => Self::Disconnected,
            Some(_) => Self::Connected,
        }
    }
}

/// Voice connection helpers and session bootstrap.
pub struct MusicManager;

impl MusicManager {
    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Get the current voice channel call handle
    pub async fn get_call(
        ctx: &Context,
        guild_id: GuildId,
    ) -> MusicResult<Arc<Mutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;
        songbird.get(guild_id).ok_or(MusicError::NotConnected)
    }

    /// Join a voice channel
    pub async fn join_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Arc<Mutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;

        let handle = songbird.join(guild_id, channel_id).await.map_err(|e| {
            error!(
                "Failed to join voice channel {} for guild {}: {}",
                channel_id, guild_id, e
            );
            MusicError::JoinError(e.to_string())
        })?;

        Ok(handle)
    }

    /// Leave a voice channel
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let songbird = Self::get_songbird(ctx).await?;

        // Check if we're in a voice channel
        if songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        songbird
            .remove(guild_id)
            .await
            .map_err(|_| MusicError::JoinError("Failed to leave voice channel".to_string()))?;

        Ok(())
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        let voice_state = guild
            .voice_states
            .get(&user_id)
            .ok_or(MusicError::UserNotInVoiceChannel)?;

        voice_state
            .channel_id
            .ok_or(MusicError::UserNotInVoiceChannel)
    }

    /// Returns the guild's playback session, joining the requesting user's
    /// voice channel and starting a new session when there is none yet.
    ///
    /// Engine events of a new session are announced in `text_channel`.
    pub async fn ensure_session(
        ctx: &Context,
        data: &Data,
        guild_id: GuildId,
        user_id: UserId,
        text_channel: ChannelId,
    ) -> MusicResult<SessionHandle> {
        let voice_channel = Self::get_user_voice_channel(ctx, guild_id, user_id)?;

        let existing = Self::get_call(ctx, guild_id).await.ok();
        let link = match &existing {
            Some(call) => VoiceLink::of(Some(&*call.lock().await)),
            None => VoiceLink::Missing,
        };

        let call = match (existing, link) {
            (Some(call), VoiceLink::Connected) => call,
            (_, link) => {
                info!(
                    "Joining voice channel {} in guild {} ({:?})",
                    voice_channel, guild_id, link
                );
                let call = Self::join_channel(ctx, guild_id, voice_channel).await?;
                // A call that survived its disconnect still carries the notifier.
                if link == VoiceLink::Missing {
                    call.lock().await.add_global_event(
                        Event::Core(CoreEvent::DriverDisconnect),
                        VoiceDisconnectNotifier {
                            guild_id,
                            sessions: Arc::clone(&data.sessions),
                        },
                    );
                }
                call
            }
        };

        let http_client = data.http_client.clone();
        let capacity = data.config.max_queue_length;
        let http = Arc::clone(&ctx.http);

        let session = data.sessions.get_or_create(guild_id, || {
            info!("Starting playback session for guild {}", guild_id);
            let (session, events) = SessionHandle::spawn(capacity, move |mailbox| {
                SongbirdSink::new(call, http_client, mailbox)
            });
            embedded_messages::spawn_announcer(http, text_channel, events);
            session
        });

        Ok(session)
    }

    /// Ends the guild's session (if any) and disconnects from voice.
    pub async fn end_session(
        ctx: &Context,
        sessions: &SessionRegistry,
        guild_id: GuildId,
    ) -> MusicResult<()> {
        sessions.close(guild_id).await;
        Self::leave_channel(ctx, guild_id).await
    }
}
