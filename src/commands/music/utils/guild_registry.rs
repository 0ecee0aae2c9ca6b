//! The process-wide map of guild to queue state, and the only code that
//! mutates it.
//!
//! Each guild sits behind its own async mutex, so commands and lifecycle
//! events for one guild are applied strictly one at a time while different
//! guilds proceed independently. The registry is an ordinary value owned by
//! the application root; tests build as many as they like.

use dashmap::DashMap;
use futures::future::join_all;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::playback::{
    LifecycleEvent, LifecycleReceiver, LifecycleSender, NoticeSink, PlayId, PlaybackConnection,
    PlaybackEvent, PlaybackTransport, QueueNotice,
};
use super::queue_manager::{Advance, Enqueued, GuildQueue, QueueSnapshot};
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Grace period after the queue empties before voice is released.
    pub idle_timeout: Duration,
}

/// What `stop` tore down.
#[derive(Debug, Clone, PartialEq)]
pub struct StopSummary {
    pub stopped: Option<TrackMetadata>,
    pub cleared: usize,
}

struct IdleTimer {
    token: u64,
    handle: JoinHandle<()>,
}

/// A live guild: its queue plus the voice connection it plays through. The two
/// exist together or not at all.
struct GuildSlot {
    queue: GuildQueue,
    connection: Box<dyn PlaybackConnection>,
    idle_timer: Option<IdleTimer>,
}

impl GuildSlot {
    fn cancel_idle_timer(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.handle.abort();
        }
    }

    fn idle_token(&self) -> Option<u64> {
        self.idle_timer.as_ref().map(|timer| timer.token)
    }
}

type GuildEntry = Arc<Mutex<Option<GuildSlot>>>;
type GuildGuard = OwnedMutexGuard<Option<GuildSlot>>;

struct RegistryInner {
    guilds: DashMap<GuildId, GuildEntry>,
    transport: Arc<dyn PlaybackTransport>,
    notices: Arc<dyn NoticeSink>,
    settings: QueueSettings,
    events: LifecycleSender,
    ids: AtomicU64,
}

/// Cheap to clone; all clones share the same guilds.
#[derive(Clone)]
pub struct QueueRegistry {
    inner: Arc<RegistryInner>,
}

impl QueueRegistry {
    /// Creates a registry. Lifecycle events from the transport arrive on the
    /// returned receiver and must be fed back through [`QueueRegistry::run`] or
    /// [`QueueRegistry::handle_event`].
    pub fn new(
        transport: Arc<dyn PlaybackTransport>,
        notices: Arc<dyn NoticeSink>,
        settings: QueueSettings,
    ) -> (Self, LifecycleReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let registry = Self {
            inner: Arc::new(RegistryInner {
                guilds: DashMap::new(),
                transport,
                notices,
                settings,
                events,
                ids: AtomicU64::new(1),
            }),
        };
        (registry, receiver)
    }

    fn next_id(&self) -> u64 {
        self.inner.ids.fetch_add(1, Ordering::Relaxed)
    }

    pub fn guild_count(&self) -> usize {
        self.inner.guilds.len()
    }

    fn is_registered(&self, guild_id: GuildId, entry: &GuildEntry) -> bool {
        self.inner
            .guilds
            .get(&guild_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), entry))
    }

    fn unregister(&self, guild_id: GuildId, entry: &GuildEntry) {
        self.inner
            .guilds
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, entry));
    }

    /// Locks the guild's entry if one is registered.
    async fn lock_existing(&self, guild_id: GuildId) -> Option<(GuildEntry, GuildGuard)> {
        loop {
            let entry = self.inner.guilds.get(&guild_id).map(|e| Arc::clone(e.value()))?;
            let guard = Arc::clone(&entry).lock_owned().await;
            // the entry may have been torn down while we waited for the lock
            if self.is_registered(guild_id, &entry) {
                return Some((entry, guard));
            }
        }
    }

    /// Locks the guild's entry, registering an empty one first if needed.
    async fn lock_or_create(&self, guild_id: GuildId) -> (GuildEntry, GuildGuard) {
        loop {
            let entry = Arc::clone(self.inner.guilds.entry(guild_id).or_default().value());
            let guard = Arc::clone(&entry).lock_owned().await;
            if self.is_registered(guild_id, &entry) {
                return (entry, guard);
            }
        }
    }

    /// Locks a guild that currently has live state.
    async fn lock_live(&self, guild_id: GuildId) -> MusicResult<(GuildEntry, GuildGuard)> {
        match self.lock_existing(guild_id).await {
            Some((entry, guard)) if guard.is_some() => Ok((entry, guard)),
            _ => Err(MusicError::NotPlaying),
        }
    }

    /// Appends `track` to the guild's queue, connecting to `voice_channel` first
    /// if the guild has no state yet, and starts it if nothing is playing.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        track: TrackMetadata,
        voice_channel: ChannelId,
        reply_channel: ChannelId,
    ) -> MusicResult<Enqueued> {
        let (entry, mut guard) = self.lock_or_create(guild_id).await;

        if guard.is_none() {
            info!("Connecting to voice channel {} in guild {}", voice_channel, guild_id);
            match self
                .inner
                .transport
                .connect(guild_id, voice_channel, self.inner.events.clone())
                .await
            {
                Ok(connection) => {
                    *guard = Some(GuildSlot {
                        queue: GuildQueue::new(voice_channel, reply_channel),
                        connection,
                        idle_timer: None,
                    });
                }
                Err(err) => {
                    error!("Failed to connect in guild {}: {}", guild_id, err);
                    self.unregister(guild_id, &entry);
                    return Err(err.into());
                }
            }
        }

        let Some(slot) = guard.as_mut() else {
            return Err(MusicError::NotPlaying);
        };

        if slot.queue.voice_channel() != voice_channel {
            return Err(MusicError::WrongVoiceChannel);
        }

        info!("Queueing '{}' in guild {}", track.title, guild_id);
        let title = track.title.clone();
        let enqueued = slot.queue.enqueue(track);

        let mut notices = Vec::new();
        if enqueued.started {
            self.advance(guild_id, &entry, slot, false, &mut notices).await;

            // the track was refused outright; the caller hears about it in the
            // command reply instead of a separate notice
            if !slot.queue.is_playing() {
                notices.retain(|notice| {
                    !matches!(notice, QueueNotice::PlaybackFailed { title: failed } if *failed == title)
                });
                self.dispatch(slot.queue.reply_channel(), notices).await;
                return Err(MusicError::PlaybackFailed(title));
            }
        }

        self.dispatch(slot.queue.reply_channel(), notices).await;
        Ok(enqueued)
    }

    /// Applies one transport lifecycle event and advances the guild's queue.
    /// Events for guilds or plays that are no longer current are dropped.
    pub async fn handle_event(&self, event: LifecycleEvent) {
        let LifecycleEvent {
            guild_id,
            play_id,
            event,
        } = event;

        let Ok((entry, mut guard)) = self.lock_live(guild_id).await else {
            debug!("Ignoring {:?} for guild {} with no queue", event, guild_id);
            return;
        };
        let Some(slot) = guard.as_mut() else {
            return;
        };

        let Some(ended) = slot.queue.finish(play_id, &event) else {
            debug!("Ignoring stale {:?} for play {} in guild {}", event, play_id, guild_id);
            return;
        };

        let mut notices = Vec::new();
        match &event {
            PlaybackEvent::Errored(reason) => {
                warn!("Playback of '{}' failed in guild {}: {}", ended.title, guild_id, reason);
                notices.push(QueueNotice::PlaybackFailed { title: ended.title });
            }
            PlaybackEvent::Finished => debug!("'{}' finished in guild {}", ended.title, guild_id),
            PlaybackEvent::Stopped => debug!("'{}' stopped in guild {}", ended.title, guild_id),
        }

        self.advance(guild_id, &entry, slot, true, &mut notices).await;
        self.dispatch(slot.queue.reply_channel(), notices).await;
    }

    /// Feeds lifecycle events into [`QueueRegistry::handle_event`] until every
    /// sender is gone. Each event is handled on its own task, so a guild stuck
    /// behind a slow connect or a slow notice never holds up the others.
    ///
    /// Ordering within a guild still holds: a play's terminal event can only be
    /// emitted after the handler that started the play released the guild lock.
    pub async fn run(self, mut events: LifecycleReceiver) {
        while let Some(event) = events.recv().await {
            let registry = self.clone();
            tokio::spawn(async move { registry.handle_event(event).await });
        }
        info!("Lifecycle event stream closed");
    }

    /// Starts the next pending track, skipping over tracks the transport refuses
    /// until the queue's failure budget runs out.
    async fn advance(
        &self,
        guild_id: GuildId,
        entry: &GuildEntry,
        slot: &mut GuildSlot,
        announce: bool,
        notices: &mut Vec<QueueNotice>,
    ) {
        loop {
            let play_id = self.next_id();
            match slot.queue.advance(play_id) {
                Advance::Play { play_id, track } => {
                    slot.cancel_idle_timer();
                    match slot.connection.play(play_id, &track).await {
                        Ok(()) => {
                            info!("Now playing '{}' in guild {}", track.title, guild_id);
                            if announce {
                                notices.push(QueueNotice::NowPlaying {
                                    track,
                                    upcoming: slot.queue.pending_len(),
                                });
                            }
                            return;
                        }
                        Err(err) => {
                            warn!("Could not start '{}' in guild {}: {}", track.title, guild_id, err);
                            slot.queue.finish(play_id, &PlaybackEvent::Errored(err.0));
                            notices.push(QueueNotice::PlaybackFailed { title: track.title });
                        }
                    }
                }
                Advance::Drained => {
                    info!("Queue drained in guild {}", guild_id);
                    self.arm_idle_timer(guild_id, entry, slot);
                    if announce {
                        notices.push(QueueNotice::QueueEnded);
                    }
                    return;
                }
                Advance::GaveUp { failures, dropped } => {
                    error!(
                        "Giving up in guild {} after {} failed plays, dropped {} tracks",
                        guild_id, failures, dropped
                    );
                    self.arm_idle_timer(guild_id, entry, slot);
                    notices.push(QueueNotice::GaveUp { failures, dropped });
                    return;
                }
            }
        }
    }

    /// (Re)starts the inactivity countdown for an idle guild.
    fn arm_idle_timer(&self, guild_id: GuildId, entry: &GuildEntry, slot: &mut GuildSlot) {
        slot.cancel_idle_timer();

        let token = self.next_id();
        let timeout = self.inner.settings.idle_timeout;
        let registry = self.clone();
        let entry = Arc::clone(entry);

        debug!("Arming idle timer ({:?}) for guild {}", timeout, guild_id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            registry.expire_idle(guild_id, entry, token).await;
        });

        slot.idle_timer = Some(IdleTimer { token, handle });
    }

    async fn expire_idle(&self, guild_id: GuildId, entry: GuildEntry, token: u64) {
        let mut guard = entry.lock().await;

        let still_idle = guard
            .as_ref()
            .is_some_and(|slot| slot.idle_token() == Some(token) && !slot.queue.is_playing());
        if !still_idle || !self.is_registered(guild_id, &entry) {
            return;
        }
        let Some(slot) = guard.take() else {
            return;
        };

        info!("Guild {} idle for {:?}, leaving voice", guild_id, self.inner.settings.idle_timeout);
        slot.connection.disconnect().await;
        self.unregister(guild_id, &entry);
        self.dispatch(slot.queue.reply_channel(), vec![QueueNotice::IdleDisconnected])
            .await;
    }

    pub async fn pause(&self, guild_id: GuildId) -> MusicResult<TrackMetadata> {
        let (_entry, mut guard) = self.lock_live(guild_id).await?;
        let slot = guard.as_mut().ok_or(MusicError::NotPlaying)?;

        let track = slot.queue.ensure_pausable()?.clone();
        slot.connection.pause().await?;
        slot.queue.set_paused(true);

        info!("Paused '{}' in guild {}", track.title, guild_id);
        Ok(track)
    }

    pub async fn resume(&self, guild_id: GuildId) -> MusicResult<TrackMetadata> {
        let (_entry, mut guard) = self.lock_live(guild_id).await?;
        let slot = guard.as_mut().ok_or(MusicError::NotPlaying)?;

        let track = slot.queue.ensure_resumable()?.clone();
        slot.connection.resume().await?;
        slot.queue.set_paused(false);

        info!("Resumed '{}' in guild {}", track.title, guild_id);
        Ok(track)
    }

    /// Stops the current track. The transport's `Stopped` event advances the
    /// queue. Returns the skipped track.
    pub async fn skip(&self, guild_id: GuildId) -> MusicResult<TrackMetadata> {
        let (_entry, guard) = self.lock_live(guild_id).await?;
        let slot = guard.as_ref().ok_or(MusicError::NotPlaying)?;

        let track = slot
            .queue
            .current_track()
            .cloned()
            .ok_or(MusicError::NotPlaying)?;
        slot.connection.stop().await?;

        info!("Skipped '{}' in guild {}", track.title, guild_id);
        Ok(track)
    }

    /// Clears everything, leaves voice and forgets the guild.
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<StopSummary> {
        let (entry, mut guard) = self.lock_live(guild_id).await?;
        let mut slot = guard.take().ok_or(MusicError::NotPlaying)?;

        slot.cancel_idle_timer();
        let summary = StopSummary {
            stopped: slot.queue.current_track().cloned(),
            cleared: slot.queue.pending_len(),
        };

        if slot.queue.is_playing() {
            if let Err(err) = slot.connection.stop().await {
                warn!("Failed to stop playback in guild {}: {}", guild_id, err);
            }
        }
        slot.connection.disconnect().await;
        self.unregister(guild_id, &entry);
        drop(guard);

        info!("Stopped guild {} ({} pending cleared)", guild_id, summary.cleared);
        Ok(summary)
    }

    pub async fn shuffle(&self, guild_id: GuildId) -> MusicResult<usize> {
        let (_entry, mut guard) = self.lock_live(guild_id).await?;
        let slot = guard.as_mut().ok_or(MusicError::NotPlaying)?;
        slot.queue.shuffle(&mut rand::rng())
    }

    pub async fn remove(&self, guild_id: GuildId, position: usize) -> MusicResult<TrackMetadata> {
        let (_entry, mut guard) = self.lock_live(guild_id).await?;
        let slot = guard.as_mut().ok_or(MusicError::NotPlaying)?;
        slot.queue.remove(position)
    }

    /// A copy of the guild's queue, if it has one.
    pub async fn snapshot(&self, guild_id: GuildId) -> Option<QueueSnapshot> {
        let (_entry, guard) = self.lock_existing(guild_id).await?;
        guard.as_ref().map(|slot| slot.queue.snapshot())
    }

    /// The play id of the guild's current track.
    pub async fn current_play_id(&self, guild_id: GuildId) -> Option<PlayId> {
        let (_entry, guard) = self.lock_existing(guild_id).await?;
        guard.as_ref().and_then(|slot| slot.queue.current_play_id())
    }

    /// Stops every guild. Used on shutdown.
    pub async fn shutdown(&self) {
        let guild_ids: Vec<GuildId> = self.inner.guilds.iter().map(|entry| *entry.key()).collect();
        info!("Shutting down {} guild queues", guild_ids.len());
        join_all(guild_ids.into_iter().map(|guild_id| self.stop(guild_id))).await;
    }

    /// Sends notices in order. Callers hold the guild lock, so a guild's
    /// notices go out in the order its state changed.
    async fn dispatch(&self, channel_id: ChannelId, notices: Vec<QueueNotice>) {
        for notice in notices {
            self.inner.notices.notify(channel_id, notice).await;
        }
    }
}
