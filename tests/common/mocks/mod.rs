//! Mock implementations for the music system's collaborators

use async_trait::async_trait;
use mockall::mock;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use viby::commands::music::utils::playback::LifecycleSender;
use viby::{
    LifecycleEvent, NoticeSink, PlayId, PlaybackConnection, PlaybackEvent, PlaybackTransport,
    QueueNotice, ResolveError, TrackMetadata, TrackResolver, TransportError,
};

mock! {
    pub Resolver {}

    #[async_trait]
    impl TrackResolver for Resolver {
        async fn resolve(&self, query: &str, requested_by: UserId) -> Result<TrackMetadata, ResolveError>;
    }
}

/// Everything the registry asked the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect(GuildId, ChannelId),
    Play(GuildId, String),
    Pause(GuildId),
    Resume(GuildId),
    Stop(GuildId),
    Disconnect(GuildId),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<TransportCall>,
    fail_connect: bool,
    failing_titles: HashSet<String>,
    active: HashMap<GuildId, PlayId>,
    senders: HashMap<GuildId, LifecycleSender>,
    connect_gate: Option<Arc<Notify>>,
}

/// An in-memory voice transport. Plays "succeed" instantly and stay active
/// until the test ends them with [`FakeTransport::finish_current`] or
/// [`FakeTransport::fail_current`], or the registry stops them.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Titles handed to `play`, in order.
    pub fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Play(_, title) => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &TransportCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    /// Parks every later `connect` until the returned gate is released with
    /// `notify_one`.
    pub fn hold_connects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().connect_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Pushes an arbitrary event into the registry's lifecycle channel.
    pub fn emit(&self, event: LifecycleEvent) {
        let state = self.state.lock().unwrap();
        let sender = state.senders.values().next().expect("never connected");
        sender.send(event).unwrap();
    }

    /// Makes `play` refuse this title outright.
    pub fn refuse(&self, title: &str) {
        self.state.lock().unwrap().failing_titles.insert(title.to_string());
    }

    pub fn finish_current(&self, guild_id: GuildId) {
        self.end_current(guild_id, PlaybackEvent::Finished);
    }

    pub fn fail_current(&self, guild_id: GuildId) {
        self.end_current(guild_id, PlaybackEvent::Errored("decoder exploded".into()));
    }

    fn end_current(&self, guild_id: GuildId, event: PlaybackEvent) {
        let mut state = self.state.lock().unwrap();
        let play_id = state.active.remove(&guild_id).expect("nothing is playing");
        let sender = state.senders.get(&guild_id).expect("never connected");
        sender
            .send(LifecycleEvent {
                guild_id,
                play_id,
                event,
            })
            .unwrap();
    }
}

#[async_trait]
impl PlaybackTransport for FakeTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        events: LifecycleSender,
    ) -> Result<Box<dyn PlaybackConnection>, TransportError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(TransportCall::Connect(guild_id, channel_id));
            state.connect_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(TransportError("voice gateway unreachable".into()));
        }
        state.senders.insert(guild_id, events);

        Ok(Box::new(FakeConnection {
            guild_id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    guild_id: GuildId,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl PlaybackConnection for FakeConnection {
    async fn play(&self, play_id: PlayId, track: &TrackMetadata) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(TransportCall::Play(self.guild_id, track.title.clone()));
        if state.failing_titles.contains(&track.title) {
            return Err(TransportError(format!("cannot stream {}", track.title)));
        }
        state.active.insert(self.guild_id, play_id);
        Ok(())
    }

    async fn pause(&self) -> Result<(), TransportError> {
        self.state.lock().unwrap().calls.push(TransportCall::Pause(self.guild_id));
        Ok(())
    }

    async fn resume(&self) -> Result<(), TransportError> {
        self.state.lock().unwrap().calls.push(TransportCall::Resume(self.guild_id));
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Stop(self.guild_id));
        let play_id = state
            .active
            .remove(&self.guild_id)
            .ok_or_else(|| TransportError("nothing to stop".into()))?;
        if let Some(sender) = state.senders.get(&self.guild_id) {
            let _ = sender.send(LifecycleEvent {
                guild_id: self.guild_id,
                play_id,
                event: PlaybackEvent::Stopped,
            });
        }
        Ok(())
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Disconnect(self.guild_id));
        state.active.remove(&self.guild_id);
    }
}

/// Collects every notice the registry sends.
#[derive(Clone, Default)]
pub struct RecordingNotices {
    sent: Arc<Mutex<Vec<(ChannelId, QueueNotice)>>>,
}

impl RecordingNotices {
    pub fn all(&self) -> Vec<QueueNotice> {
        self.sent.lock().unwrap().iter().map(|(_, notice)| notice.clone()).collect()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.sent.lock().unwrap().iter().map(|(channel, _)| *channel).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NoticeSink for RecordingNotices {
    async fn notify(&self, channel_id: ChannelId, notice: QueueNotice) {
        self.sent.lock().unwrap().push((channel_id, notice));
    }
}
