use super::*;

/// Shuffle the songs waiting in the queue
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let Some(session) = existing_session(ctx).await? else {
        return Ok(());
    };

    let reply = match session.shuffle().await {
        Ok(()) => embedded_messages::shuffled(),
        Err(MusicError::EmptyQueue) => embedded_messages::queue_is_empty(),
        Err(err) => embedded_messages::error_reply(&err),
    };
    ctx.send(reply).await?;

    Ok(())
}
