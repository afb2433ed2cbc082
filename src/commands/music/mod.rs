//! Music playback commands and the machinery behind them.

pub(crate) mod clear;
pub(crate) mod leave;
pub(crate) mod play;
pub(crate) mod playlist;
pub(crate) mod queue;
pub(crate) mod shuffle;
pub(crate) mod skip;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context, Error};
use poise::CreateReply;
use poise::serenity_prelude::GuildId;
use tracing::info;
use utils::{embedded_messages, music_manager::MusicError, session::SessionHandle};

fn guild_id(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Box::new(MusicError::NotInGuild) as Error)
}

/// The guild's running session, or `None` after telling the user there is
/// nothing to control.
async fn existing_session(ctx: Context<'_>) -> Result<Option<SessionHandle>, Error> {
    let guild_id = guild_id(ctx)?;
    match ctx.data().sessions.get(guild_id) {
        Some(session) => Ok(Some(session)),
        None => {
            info!("No playback session in guild {}", guild_id);
            ctx.send(embedded_messages::bot_not_in_voice_channel())
                .await?;
            Ok(None)
        }
    }
}
