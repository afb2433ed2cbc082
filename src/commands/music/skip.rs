use super::*;

/// Skip the currently playing song
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("next"),
    category = "Music"
)]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let Some(session) = existing_session(ctx).await? else {
        return Ok(());
    };

    let reply = match session.skip().await {
        Ok(track) => embedded_messages::skipped(&track),
        Err(MusicError::NotPlaying) => embedded_messages::no_track_playing(),
        Err(err) => embedded_messages::error_reply(&err),
    };
    ctx.send(reply).await?;

    Ok(())
}
