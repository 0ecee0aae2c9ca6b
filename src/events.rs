use poise::serenity_prelude as serenity;
use serenity::{FullEvent, Interaction};
use tracing::{error, info};

use crate::commands::music::utils::component_handlers;
use crate::{Data, Error};

/// Gateway events the framework doesn't handle itself.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("{} is connected", data_about_bot.user.name);
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } if component.data.custom_id.starts_with("music_") => {
            if let Err(e) = component_handlers::handle_interaction(ctx, &data.music, component).await {
                error!("Error handling component interaction: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}
