//! The music commands. Each one checks where the caller is, delegates to the
//! [`MusicManager`](utils::music_manager::MusicManager) and renders the outcome.

pub mod nowplaying;
pub mod pause;
pub mod play;
pub mod queue;
pub mod remove;
pub mod resume;
pub mod shuffle;
pub mod skip;
pub mod stop;

pub mod audio_sources;
pub mod utils;

use poise::CreateReply;
use tracing::debug;

use crate::{CommandResult, Context, Data, Error};
use utils::embedded_messages;
use utils::music_manager::{Invoker, MusicError, MusicResult};

/// Every music command, for registration with the framework.
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        play::play(),
        pause::pause(),
        resume::resume(),
        skip::skip(),
        stop::stop(),
        queue::queue(),
        nowplaying::nowplaying(),
        shuffle::shuffle(),
        remove::remove(),
    ]
}

/// Who ran the command, and which voice channel they're sitting in.
fn invoker(ctx: Context<'_>) -> MusicResult<Invoker> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    Ok(Invoker::from_cache(
        ctx.serenity_context(),
        guild_id,
        ctx.author().id,
        ctx.channel_id(),
    ))
}

/// Sends `render(value)` on success, or an ephemeral error embed.
async fn reply<T>(
    ctx: Context<'_>,
    result: MusicResult<T>,
    render: impl FnOnce(T) -> CreateReply,
) -> CommandResult {
    let reply = match result {
        Ok(value) => render(value),
        Err(err) => {
            debug!("/{} failed: {:?}", ctx.command().name, err);
            embedded_messages::music_error(&err)
        }
    };
    ctx.send(reply).await?;
    Ok(())
}
