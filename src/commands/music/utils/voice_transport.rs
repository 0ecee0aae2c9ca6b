//! [`PlaybackTransport`] backed by songbird: voice connections through the
//! gateway, audio streamed by songbird's yt-dlp input.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::YoutubeDl;
use songbird::tracks::{Track, TrackHandle};
use songbird::{Call, Event, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::event_handlers::TrackLifecycleNotifier;
use super::playback::{
    LifecycleSender, PlayId, PlaybackConnection, PlaybackTransport, TransportError,
};
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
    http_client: reqwest::Client,
    volume: f32,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>, volume: f32) -> Self {
        Self {
            songbird,
            http_client: reqwest::Client::new(),
            volume,
        }
    }
}

#[async_trait]
impl PlaybackTransport for SongbirdTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        events: LifecycleSender,
    ) -> Result<Box<dyn PlaybackConnection>, TransportError> {
        let call = match self.songbird.join(guild_id, channel_id).await {
            Ok(call) => call,
            Err(e) => {
                error!(
                    "Failed to join voice channel {} for guild {}: {}",
                    channel_id, guild_id, e
                );
                // don't leave a half-open call behind for the next attempt to trip over
                if let Err(remove_err) = self.songbird.remove(guild_id).await {
                    debug!("No call to clean up in guild {}: {}", guild_id, remove_err);
                }
                return Err(TransportError(format!("Failed to join voice channel: {}", e)));
            }
        };

        {
            let mut handler = call.lock().await;
            if let Err(e) = handler.deafen(true).await {
                warn!("Failed to self-deafen in guild {}: {}", guild_id, e);
            }
        }

        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(Box::new(SongbirdConnection {
            guild_id,
            songbird: Arc::clone(&self.songbird),
            call,
            current: Mutex::new(None),
            http_client: self.http_client.clone(),
            volume: self.volume,
            events,
        }))
    }
}

struct SongbirdConnection {
    guild_id: GuildId,
    songbird: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    current: Mutex<Option<TrackHandle>>,
    http_client: reqwest::Client,
    volume: f32,
    events: LifecycleSender,
}

impl SongbirdConnection {
    async fn current_handle(&self) -> Result<TrackHandle, TransportError> {
        self.current
            .lock()
            .await
            .clone()
            .ok_or_else(|| TransportError("No active track".to_string()))
    }
}

#[async_trait]
impl PlaybackConnection for SongbirdConnection {
    async fn play(&self, play_id: PlayId, track: &TrackMetadata) -> Result<(), TransportError> {
        let input = YoutubeDl::new(self.http_client.clone(), track.url.clone());
        let source = Track::from(input).volume(self.volume);

        let handle = {
            let mut handler = self.call.lock().await;
            handler.play_only(source)
        };
        debug!("Track handle created for: {}", track.title);

        let notifier = TrackLifecycleNotifier::new(self.guild_id, play_id, self.events.clone());
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| TransportError(format!("Failed to watch track: {}", e)))?;
        }

        *self.current.lock().await = Some(handle);
        Ok(())
    }

    async fn pause(&self) -> Result<(), TransportError> {
        self.current_handle()
            .await?
            .pause()
            .map_err(|e| TransportError(format!("Failed to pause: {}", e)))
    }

    async fn resume(&self) -> Result<(), TransportError> {
        self.current_handle()
            .await?
            .play()
            .map_err(|e| TransportError(format!("Failed to resume: {}", e)))
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let handle = self.current.lock().await.take();
        match handle {
            Some(handle) => handle
                .stop()
                .map_err(|e| TransportError(format!("Failed to stop: {}", e))),
            None => Err(TransportError("No active track".to_string())),
        }
    }

    async fn disconnect(&self) {
        self.current.lock().await.take();
        if let Err(e) = self.songbird.remove(self.guild_id).await {
            warn!("Failed to leave voice in guild {}: {}", self.guild_id, e);
        } else {
            info!("Left voice channel in guild {}", self.guild_id);
        }
    }
}
