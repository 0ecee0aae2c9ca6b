//! Sample data used across the integration tests

use serenity::model::id::{ChannelId, GuildId, UserId};
use std::time::Duration;
use viby::TrackMetadata;

pub fn guild() -> GuildId {
    GuildId::new(1)
}

pub fn other_guild() -> GuildId {
    GuildId::new(2)
}

/// The voice channel the bot gets summoned to.
pub fn voice() -> ChannelId {
    ChannelId::new(10)
}

pub fn other_voice() -> ChannelId {
    ChannelId::new(11)
}

pub fn text() -> ChannelId {
    ChannelId::new(20)
}

pub fn user() -> UserId {
    UserId::new(30)
}

pub fn track(title: &str) -> TrackMetadata {
    TrackMetadata {
        title: title.to_string(),
        author: "Test Artist".to_string(),
        url: format!("https://www.youtube.com/watch?v={}", title),
        duration: Some(Duration::from_secs(180)),
        thumbnail: None,
        requested_by: user(),
    }
}
