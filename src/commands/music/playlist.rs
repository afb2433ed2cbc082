use super::*;
use crate::commands::music::audio_sources::PlaylistSource;
use crate::commands::music::utils::{music_manager::MusicManager, song_fetchers::ingest_playlist};
use tracing::{error, info};

/// Queue the tracks of a YouTube or Spotify playlist
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("pl", "l"),
    category = "Music"
)]
pub async fn playlist(
    ctx: Context<'_>,
    #[description = "YouTube or Spotify playlist URL"] url: String,
) -> CommandResult {
    info!("Received playlist command with url: {}", url);
    let guild_id = guild_id(ctx)?;
    let data = ctx.data();

    let Some((source, playlist_id)) = PlaylistSource::parse(&url) else {
        ctx.send(embedded_messages::invalid_playlist_url(&url)).await?;
        return Ok(());
    };

    let reader = match source {
        PlaylistSource::YouTube => data.youtube.clone(),
        PlaylistSource::Spotify => data.spotify.clone(),
    };
    let Some(reader) = reader else {
        ctx.send(embedded_messages::playlist_unavailable(source))
            .await?;
        return Ok(());
    };

    ctx.defer().await?;

    let session = match MusicManager::ensure_session(
        ctx.serenity_context(),
        data,
        guild_id,
        ctx.author().id,
        ctx.channel_id(),
    )
    .await
    {
        Ok(session) => session,
        Err(err @ MusicError::UserNotInVoiceChannel) => {
            ctx.send(embedded_messages::user_not_in_voice_channel(err))
                .await?;
            return Ok(());
        }
        Err(err) => {
            error!("Failed to start a session in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::error_reply(&err)).await?;
            return Ok(());
        }
    };

    let max_items = data.config.playlist_max_items;
    ctx.send(embedded_messages::searching_playlist(source, max_items))
        .await?;

    let entries = reader.list_tracks(&playlist_id, max_items);
    match ingest_playlist(entries, data.resolver.as_ref(), &session).await {
        Ok(report) => {
            ctx.send(CreateReply::default().embed(embedded_messages::playlist_summary(&report)))
                .await?;
        }
        Err(err) => {
            error!("Playlist ingestion aborted in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::error_reply(&err)).await?;
        }
    }

    Ok(())
}
