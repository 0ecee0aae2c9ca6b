use poise::serenity_prelude as serenity;
use serenity::all::{ChannelId, CreateMessage, Http};
use serenity::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::button_controls;
use super::embedded_messages;
use super::playback::{NoticeSink, QueueNotice};

/// Posts queue notices as embeds in the guild's reply channel.
pub struct ChannelNotifier {
    http: Arc<Http>,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NoticeSink for ChannelNotifier {
    async fn notify(&self, channel_id: ChannelId, notice: QueueNotice) {
        let mut message = CreateMessage::new().embed(embedded_messages::notice(&notice));
        if matches!(notice, QueueNotice::NowPlaying { .. }) {
            message = message.components(button_controls::create_music_control_buttons(false));
        }

        if let Err(e) = channel_id.send_message(&self.http, message).await {
            warn!("Failed to send {:?} to channel {}: {}", notice, channel_id, e);
        }
    }
}
