use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Skip the currently playing song
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.skip(&invoker).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, |track| embedded_messages::skipped(&track)).await
}
