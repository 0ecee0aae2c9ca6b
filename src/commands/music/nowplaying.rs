use super::reply;
use super::utils::embedded_messages;
use super::utils::music_manager::MusicError;
use crate::{CommandResult, Context};

/// Show the track that's playing right now
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Music",
    aliases("np")
)]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    let result = match ctx.guild_id() {
        Some(guild_id) => ctx.data().music.now_playing(guild_id).await,
        None => Err(MusicError::NotInGuild),
    };
    reply(ctx, result, |now| {
        embedded_messages::now_playing_reply(&now.track, now.paused, now.upcoming)
    })
    .await
}
