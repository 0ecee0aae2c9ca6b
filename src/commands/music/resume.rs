use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Resume a paused track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.resume(&invoker).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, |track| embedded_messages::resumed(&track)).await
}
