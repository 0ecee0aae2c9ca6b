use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Remove a track from the queue by its position
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position in the up next list (1 is the next track)"]
    #[min = 1]
    position: usize,
) -> CommandResult {
    let result = match invoker(ctx) {
        Ok(invoker) => ctx.data().music.remove(&invoker, position).await,
        Err(err) => Err(err),
    };
    reply(ctx, result, |track| embedded_messages::track_removed(&track, position)).await
}
