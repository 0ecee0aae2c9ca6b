use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext, EventHandler};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use super::playback::{LifecycleEvent, LifecycleSender, PlayId, PlaybackEvent};

/// Forwards the end of one songbird track to the queue registry as a
/// [`LifecycleEvent`].
///
/// Registered for both `TrackEvent::End` and `TrackEvent::Error`; clones share
/// one flag so a play reports exactly once even when songbird fires both.
#[derive(Clone)]
pub struct TrackLifecycleNotifier {
    pub guild_id: serenity::GuildId,
    pub play_id: PlayId,
    pub events: LifecycleSender,
    fired: Arc<AtomicBool>,
}

impl TrackLifecycleNotifier {
    pub fn new(guild_id: serenity::GuildId, play_id: PlayId, events: LifecycleSender) -> Self {
        Self {
            guild_id,
            play_id,
            events,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Maps songbird's final play mode onto our terminal events. Anything still
    /// live is not terminal.
    pub fn classify(mode: &PlayMode) -> Option<PlaybackEvent> {
        match mode {
            PlayMode::End => Some(PlaybackEvent::Finished),
            PlayMode::Stop => Some(PlaybackEvent::Stopped),
            PlayMode::Errored(err) => Some(PlaybackEvent::Errored(err.to_string())),
            _ => None,
        }
    }

    fn report(&self, event: PlaybackEvent) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("Play {} in guild {} ended: {:?}", self.play_id, self.guild_id, event);

        let sent = self.events.send(LifecycleEvent {
            guild_id: self.guild_id,
            play_id: self.play_id,
            event,
        });
        if sent.is_err() {
            warn!("Lifecycle receiver dropped, event for guild {} lost", self.guild_id);
        }
    }
}

#[async_trait]
impl EventHandler for TrackLifecycleNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            let event = tracks
                .iter()
                .find_map(|(state, _)| Self::classify(&state.playing))
                .unwrap_or(PlaybackEvent::Finished);
            self.report(event);
        }
        None
    }
}
