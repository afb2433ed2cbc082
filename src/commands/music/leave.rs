use super::*;
use crate::commands::music::utils::music_manager::MusicManager;

/// Stop playing and leave the voice channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("stop", "tamana"),
    category = "Music"
)]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    match MusicManager::end_session(ctx.serenity_context(), &ctx.data().sessions, guild_id).await
    {
        Ok(()) => {
            ctx.send(embedded_messages::left_voice_channel()).await?;
        }
        Err(err) => {
            ctx.send(embedded_messages::failed_to_leave_voice_channel(err))
                .await?;
        }
    }

    Ok(())
}
