use super::*;

/// Remove every song waiting in the queue
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("clear_queue", "cq"),
    category = "Music"
)]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    let Some(session) = existing_session(ctx).await? else {
        return Ok(());
    };

    let removed = session.clear().await?;
    ctx.send(embedded_messages::cleared(removed)).await?;

    Ok(())
}
