use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Pause the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.pause(&invoker).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, |track| embedded_messages::paused(&track)).await
}
