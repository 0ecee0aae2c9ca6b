use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Stop the music, clear the queue and leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.stop(&invoker).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, |summary| embedded_messages::stopped(&summary)).await
}
