//! The seams between the guild queue and the outside world: the playback
//! transport that turns a track into audio, and the sink that delivers
//! unsolicited notices to a guild's text channel.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

/// Identifies a single play request. Unique for the lifetime of a registry,
/// so events from an earlier play (or an earlier connection) can never be
/// mistaken for the current one.
pub type PlayId = u64;

/// Terminal outcome of a play request. The transport emits exactly one per play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The track reached its natural end.
    Finished,
    /// Playback was stopped on request (skip).
    Stopped,
    /// The source could not be played.
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub guild_id: GuildId,
    pub play_id: PlayId,
    pub event: PlaybackEvent,
}

pub type LifecycleSender = mpsc::UnboundedSender<LifecycleEvent>;
pub type LifecycleReceiver = mpsc::UnboundedReceiver<LifecycleEvent>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Produces voice connections for guilds.
#[async_trait]
pub trait PlaybackTransport: Send + Sync {
    /// Joins `channel_id` in `guild_id`. Every lifecycle event for plays issued on
    /// the returned connection is delivered through `events`.
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        events: LifecycleSender,
    ) -> Result<Box<dyn PlaybackConnection>, TransportError>;
}

/// An established voice connection for one guild.
#[async_trait]
pub trait PlaybackConnection: Send + Sync {
    /// Starts `track`, replacing whatever was playing.
    async fn play(&self, play_id: PlayId, track: &TrackMetadata) -> Result<(), TransportError>;

    async fn pause(&self) -> Result<(), TransportError>;

    async fn resume(&self) -> Result<(), TransportError>;

    /// Stops the active play. The transport reports it as [`PlaybackEvent::Stopped`].
    async fn stop(&self) -> Result<(), TransportError>;

    /// Leaves the voice channel. Events for earlier plays may still trickle in
    /// afterwards and are ignored by the registry.
    async fn disconnect(&self);
}

/// Something worth telling a guild about without being asked.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueNotice {
    NowPlaying {
        track: TrackMetadata,
        upcoming: usize,
    },
    PlaybackFailed {
        title: String,
    },
    /// Too many plays failed back to back; the rest of the queue was dropped.
    GaveUp {
        failures: u32,
        dropped: usize,
    },
    QueueEnded,
    IdleDisconnected,
}

#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn notify(&self, channel_id: ChannelId, notice: QueueNotice);
}
