use poise::serenity_prelude::{self as serenity, Context};
use serenity::all::{
    ComponentInteraction, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::button_controls::{self, MusicButton};
use super::embedded_messages;
use super::music_manager::{Invoker, MusicError, MusicManager};
use crate::CommandResult;

/// Handle a press on one of the music control buttons
pub async fn handle_interaction(
    ctx: &Context,
    music: &Arc<MusicManager>,
    interaction: &ComponentInteraction,
) -> CommandResult {
    let Some(button) = MusicButton::from_custom_id(&interaction.data.custom_id) else {
        debug!("Ignoring unknown button {}", interaction.data.custom_id);
        return Ok(());
    };
    let Some(guild_id) = interaction.guild_id else {
        return error_followup(ctx, interaction, &MusicError::NotInGuild).await;
    };

    info!("Button {:?} pressed by {} in guild {}", button, interaction.user.id, guild_id);
    let invoker = Invoker::from_cache(ctx, guild_id, interaction.user.id, interaction.channel_id);

    let result = match button {
        MusicButton::PauseResume => music.toggle_pause(&invoker).await.map(|paused| {
            let verb = if paused { "Paused" } else { "Resumed" };
            (format!("{} by <@{}>", verb, invoker.user_id), Some(paused))
        }),
        MusicButton::Skip => music.skip(&invoker).await.map(|track| {
            let title = embedded_messages::display_title(&track.title);
            (format!("Skipped **{}**", title), None)
        }),
        MusicButton::Stop => music
            .stop(&invoker)
            .await
            .map(|_| ("Stopped playback and cleared the queue".to_string(), None)),
        MusicButton::Shuffle => music
            .shuffle(&invoker)
            .await
            .map(|count| (format!("Shuffled {} upcoming tracks", count), None)),
    };

    match result {
        Ok((message, paused)) => {
            let mut response = CreateInteractionResponseMessage::new().content(message);
            // keep the pause/resume label in step with the player
            if let Some(paused) = paused {
                response = response.components(button_controls::create_music_control_buttons(paused));
            }
            let response = match paused {
                Some(_) => CreateInteractionResponse::UpdateMessage(response),
                None => CreateInteractionResponse::Message(response),
            };
            interaction.create_response(&ctx.http, response).await?;
            Ok(())
        }
        Err(err) => error_followup(ctx, interaction, &err).await,
    }
}

async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    err: &MusicError,
) -> CommandResult {
    interaction.defer_ephemeral(&ctx.http).await?;
    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .embed(embedded_messages::error_embed(&err.to_string()))
                .ephemeral(true),
        )
        .await?;
    Ok(())
}
