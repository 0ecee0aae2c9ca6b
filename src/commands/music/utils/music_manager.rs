use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::guild_registry::{QueueRegistry, StopSummary};
use super::playback::TransportError;
use super::queue_manager::QueueSnapshot;
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
use crate::commands::music::audio_sources::{ResolveError, TrackResolver};

/// Errors that can occur during music operations.
///
/// Every message is a single line meant for the person who issued the command;
/// underlying reasons are kept in the variant for logging only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MusicError {
    #[error("I couldn't find anything matching that")]
    NotFound(String),

    #[error("I couldn't load that track right now, please try again")]
    ResolutionError(String),

    #[error("You need to be in a voice channel to do that")]
    NotInVoiceChannel,

    #[error("You need to be in the same voice channel as me to do that")]
    WrongVoiceChannel,

    #[error("Nothing is playing right now")]
    NotPlaying,

    #[error("Playback isn't paused")]
    NotPaused,

    #[error("Playback is already paused")]
    AlreadyPaused,

    #[error("I couldn't play that track, try another one")]
    PlaybackFailed(String),

    #[error("Something went wrong with the voice connection")]
    TransportError(String),

    #[error("This command only works in a server")]
    NotInGuild,

    #[error("The queue is empty")]
    EmptyQueue,

    #[error("There's no track at that position, the queue has {0} upcoming")]
    InvalidPosition(usize),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

impl From<ResolveError> for MusicError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(query) => MusicError::NotFound(query),
            other => MusicError::ResolutionError(other.to_string()),
        }
    }
}

impl From<TransportError> for MusicError {
    fn from(err: TransportError) -> Self {
        MusicError::TransportError(err.0)
    }
}

/// Who issued a command and from where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invoker {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// The voice channel the user is sitting in, if any.
    pub voice_channel: Option<ChannelId>,
    /// Where replies and later notices go.
    pub text_channel: ChannelId,
}

impl Invoker {
    /// Builds an invoker, looking the user's voice channel up in the cache.
    pub fn from_cache(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
        text_channel: ChannelId,
    ) -> Self {
        Self {
            guild_id,
            user_id,
            voice_channel: MusicManager::get_user_voice_channel(ctx, guild_id, user_id),
            text_channel,
        }
    }
}

/// A track that was just queued.
#[derive(Debug, Clone, PartialEq)]
pub struct Queued {
    pub track: TrackMetadata,
    pub position: usize,
    pub started: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub track: TrackMetadata,
    pub paused: bool,
    pub upcoming: usize,
}

/// The command-facing side of the music system: checks the caller may act on
/// the guild's playback, then hands off to the resolver and the registry.
pub struct MusicManager {
    registry: QueueRegistry,
    resolver: Arc<dyn TrackResolver>,
}

impl MusicManager {
    pub fn new(registry: QueueRegistry, resolver: Arc<dyn TrackResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &QueueRegistry {
        &self.registry
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Option<ChannelId> {
        let guild = ctx.cache.guild(guild_id)?;
        guild.voice_states.get(&user_id)?.channel_id
    }

    /// The caller's voice channel, which must match the bot's if it is already
    /// connected. Returns the guild's snapshot alongside, when it has one.
    async fn check_voice(&self, invoker: &Invoker) -> MusicResult<(ChannelId, Option<QueueSnapshot>)> {
        let voice_channel = invoker.voice_channel.ok_or(MusicError::NotInVoiceChannel)?;
        let snapshot = self.registry.snapshot(invoker.guild_id).await;

        if let Some(snapshot) = &snapshot {
            if snapshot.voice_channel != voice_channel {
                debug!(
                    "User {} is in {} but guild {} plays in {}",
                    invoker.user_id, voice_channel, invoker.guild_id, snapshot.voice_channel
                );
                return Err(MusicError::WrongVoiceChannel);
            }
        }

        Ok((voice_channel, snapshot))
    }

    /// Like [`Self::check_voice`], but the guild must also have queue state.
    async fn check_controls(&self, invoker: &Invoker) -> MusicResult<QueueSnapshot> {
        let (_, snapshot) = self.check_voice(invoker).await?;
        snapshot.ok_or(MusicError::NotPlaying)
    }

    /// Resolves `query` and queues the result, joining the caller's channel if
    /// needed.
    pub async fn play(&self, invoker: &Invoker, query: &str) -> MusicResult<Queued> {
        let (voice_channel, _) = self.check_voice(invoker).await?;

        info!("Resolving '{}' for guild {}", query, invoker.guild_id);
        let track = self
            .resolver
            .resolve(query, invoker.user_id)
            .await
            .inspect_err(|e| warn!("Failed to resolve '{}': {}", query, e))?;

        let enqueued = self
            .registry
            .enqueue(invoker.guild_id, track.clone(), voice_channel, invoker.text_channel)
            .await?;

        Ok(Queued {
            track,
            position: enqueued.position,
            started: enqueued.started,
        })
    }

    pub async fn pause(&self, invoker: &Invoker) -> MusicResult<TrackMetadata> {
        self.check_controls(invoker).await?;
        self.registry.pause(invoker.guild_id).await
    }

    pub async fn resume(&self, invoker: &Invoker) -> MusicResult<TrackMetadata> {
        self.check_controls(invoker).await?;
        self.registry.resume(invoker.guild_id).await
    }

    /// Pauses when playing, resumes when paused. Returns whether playback is now
    /// paused.
    pub async fn toggle_pause(&self, invoker: &Invoker) -> MusicResult<bool> {
        let snapshot = self.check_controls(invoker).await?;
        if snapshot.paused {
            self.registry.resume(invoker.guild_id).await?;
            Ok(false)
        } else {
            self.registry.pause(invoker.guild_id).await?;
            Ok(true)
        }
    }

    pub async fn skip(&self, invoker: &Invoker) -> MusicResult<TrackMetadata> {
        self.check_controls(invoker).await?;
        self.registry.skip(invoker.guild_id).await
    }

    pub async fn stop(&self, invoker: &Invoker) -> MusicResult<StopSummary> {
        self.check_controls(invoker).await?;
        self.registry.stop(invoker.guild_id).await
    }

    pub async fn shuffle(&self, invoker: &Invoker) -> MusicResult<usize> {
        self.check_controls(invoker).await?;
        self.registry.shuffle(invoker.guild_id).await
    }

    pub async fn remove(&self, invoker: &Invoker, position: usize) -> MusicResult<TrackMetadata> {
        self.check_controls(invoker).await?;
        self.registry.remove(invoker.guild_id, position).await
    }

    /// The guild's queue. Anyone may look, wherever they are.
    pub async fn queue(&self, guild_id: GuildId) -> MusicResult<QueueSnapshot> {
        self.registry
            .snapshot(guild_id)
            .await
            .filter(|snapshot| !snapshot.is_empty())
            .ok_or(MusicError::EmptyQueue)
    }

    /// The current track, whether it is paused and how many follow it.
    pub async fn now_playing(&self, guild_id: GuildId) -> MusicResult<NowPlaying> {
        let snapshot = self.registry.snapshot(guild_id).await.ok_or(MusicError::NotPlaying)?;
        let upcoming = snapshot.pending.len();
        let paused = snapshot.paused;
        snapshot
            .current
            .map(|track| NowPlaying {
                track,
                paused,
                upcoming,
            })
            .ok_or(MusicError::NotPlaying)
    }
}
