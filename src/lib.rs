//! Viby, a Discord music bot.
//!
//! The heart of the crate is the per-guild queue in
//! [`commands::music::utils::queue_manager`] and the registry that drives it in
//! [`commands::music::utils::guild_registry`]. Everything else is command glue,
//! presentation, or a thin adapter over songbird and yt-dlp.

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod events;

pub use commands::music::audio_sources::{ResolveError, TrackResolver, track_metadata::TrackMetadata};
pub use commands::music::utils::guild_registry::{QueueRegistry, QueueSettings};
pub use commands::music::utils::music_manager::{MusicError, MusicManager, MusicResult};
pub use commands::music::utils::playback::{
    LifecycleEvent, NoticeSink, PlayId, PlaybackConnection, PlaybackEvent, PlaybackTransport,
    QueueNotice, TransportError,
};
pub use commands::music::utils::queue_manager::{Enqueued, GuildQueue, QueueSnapshot};
pub use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub music: Arc<MusicManager>,
    pub config: Config,
}
