use tracing::info;

use super::utils::embedded_messages;
use super::{invoker, reply};
use crate::{CommandResult, Context};

/// Play a song from YouTube or a direct URL
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);

    let result = match invoker(ctx) {
        Ok(invoker) => {
            // resolving can take a while
            ctx.defer().await?;
            ctx.data().music.play(&invoker, &query).await
        }
        Err(err) => Err(err),
    };

    reply(ctx, result, |queued| embedded_messages::queued(&queued)).await
}
