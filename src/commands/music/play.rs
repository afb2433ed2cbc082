use super::*;
use crate::commands::music::utils::music_manager::MusicManager;
use tracing::{error, info};

/// Play a song from a YouTube search or a direct URL
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("p"),
    category = "Music"
)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = guild_id(ctx)?;

    // Resolving can take a while
    ctx.defer().await?;

    let session = match MusicManager::ensure_session(
        ctx.serenity_context(),
        ctx.data(),
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

    let track = match ctx.data().resolver.resolve_search(&query).await {
        Ok(track) => track,
        Err(MusicError::NotFound(_)) => {
            ctx.send(embedded_messages::no_results(&query)).await?;
            return Ok(());
        }
        Err(err) => {
            error!("Failed to resolve '{}': {}", query, err);
            ctx.send(embedded_messages::error_reply(&err)).await?;
            return Ok(());
        }
    };

    let reply = match session.enqueue_and_advance(track.clone()).await {
        Ok(position) => embedded_messages::added_to_queue(&track, position),
        Err(MusicError::QueueFull(capacity)) => embedded_messages::queue_full(capacity),
        Err(err) => embedded_messages::error_reply(&err),
    };
    ctx.send(reply).await?;

    Ok(())
}
