use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Shuffle the upcoming tracks
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.shuffle(&invoker).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, embedded_messages::shuffled).await
}
