use super::*;
use crate::commands::music::utils::button_controls::{page_after_press, queue_page_buttons};
use poise::serenity_prelude::{
    ComponentInteraction, ComponentInteractionCollector, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use std::time::Duration;
use tracing::debug;

/// How long the page buttons keep working.
const QUEUE_BUTTON_TIMEOUT: Duration = Duration::from_secs(60);

/// Show the songs waiting in the queue
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("check_queue", "q"),
    category = "Music"
)]
pub async fn queue(
    ctx: Context<'_>,
    #[description = "Page to show, starting at 1"] page: Option<usize>,
) -> CommandResult {
    let Some(session) = existing_session(ctx).await? else {
        return Ok(());
    };

    let page_size = ctx.data().config.queue_page_size;
    let requested = page.unwrap_or(1).saturating_sub(1);
    let mut page = session.snapshot(page_size, requested).await?;
    let mut now_playing = session.now_playing().await?;

    let embed = embedded_messages::music_queue(now_playing.as_ref(), &page);
    if page.total_pages <= 1 {
        ctx.send(CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let message_key = ctx.id();
    let reply = ctx
        .send(
            CreateReply::default()
                .embed(embed)
                .components(queue_page_buttons(message_key, page.page_index, page.total_pages)),
        )
        .await?;

    let key_suffix = format!(":{}", message_key);
    while let Some(press) = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(QUEUE_BUTTON_TIMEOUT)
        .filter({
            let key_suffix = key_suffix.clone();
            move |press: &ComponentInteraction| press.data.custom_id.ends_with(&key_suffix)
        })
        .await
    {
        let Some(next_page) = page_after_press(
            &press.data.custom_id,
            message_key,
            page.page_index,
            page.total_pages,
        ) else {
            continue;
        };

        page = session.snapshot(page_size, next_page).await?;
        now_playing = session.now_playing().await?;

        press
            .create_response(
                ctx.serenity_context(),
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .embed(embedded_messages::music_queue(now_playing.as_ref(), &page))
                        .components(queue_page_buttons(
                            message_key,
                            page.page_index,
                            page.total_pages,
                        )),
                ),
            )
            .await?;
    }

    debug!("Queue buttons for {} timed out", message_key);
    reply
        .edit(
            ctx,
            CreateReply::default()
                .embed(embedded_messages::music_queue(now_playing.as_ref(), &page))
                .components(Vec::new()),
        )
        .await?;

    Ok(())
}
