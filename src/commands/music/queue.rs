use super::reply;
use super::utils::embedded_messages;
use super::utils::music_manager::MusicError;
use crate::{CommandResult, Context};

/// View the current music queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let result = match ctx.guild_id() {
        Some(guild_id) => ctx.data().music.queue(guild_id).await,
        None => Err(MusicError::NotInGuild),
    };
    reply(ctx, result, |snapshot| embedded_messages::music_queue(&snapshot)).await
}
