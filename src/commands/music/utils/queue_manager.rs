use rand::Rng;
use rand::seq::SliceRandom;
use serenity::model::id::ChannelId;
use std::collections::VecDeque;

use super::music_manager::{MusicError, MusicResult};
use super::playback::{PlayId, PlaybackEvent};
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

/// Plays that may fail back to back before the rest of the queue is abandoned.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// The track currently handed to the transport.
#[derive(Debug, Clone, PartialEq)]
struct NowPlaying {
    play_id: PlayId,
    track: TrackMetadata,
}

/// Result of appending a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position in the full ordering (current track first).
    pub position: usize,
    /// Nothing was playing, so the track starts right away.
    pub started: bool,
}

/// What the registry must do after [`GuildQueue::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Hand `track` to the transport under `play_id`.
    Play { play_id: PlayId, track: TrackMetadata },
    /// Nothing left; the inactivity timer should start.
    Drained,
    /// Too many consecutive failures; `dropped` pending tracks were discarded.
    GaveUp { failures: u32, dropped: usize },
}

/// Read-only copy of a guild's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub current: Option<TrackMetadata>,
    pub pending: Vec<TrackMetadata>,
    pub paused: bool,
    pub voice_channel: ChannelId,
}

impl QueueSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }
}

/// Queue and playback state for one guild.
///
/// Invariants: a track is current exactly while the guild counts as playing,
/// and the current track is never also pending. Nothing here performs I/O; the
/// registry applies the returned [`Advance`] to the transport.
#[derive(Debug)]
pub struct GuildQueue {
    pending: VecDeque<TrackMetadata>,
    current: Option<NowPlaying>,
    paused: bool,
    failures: u32,
    voice_channel: ChannelId,
    reply_channel: ChannelId,
}

impl GuildQueue {
    pub fn new(voice_channel: ChannelId, reply_channel: ChannelId) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            paused: false,
            failures: 0,
            voice_channel,
            reply_channel,
        }
    }

    pub fn voice_channel(&self) -> ChannelId {
        self.voice_channel
    }

    pub fn reply_channel(&self) -> ChannelId {
        self.reply_channel
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_track(&self) -> Option<&TrackMetadata> {
        self.current.as_ref().map(|now| &now.track)
    }

    pub fn current_play_id(&self) -> Option<PlayId> {
        self.current.as_ref().map(|now| now.play_id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Appends `track` to the pending sequence.
    pub fn enqueue(&mut self, track: TrackMetadata) -> Enqueued {
        let started = !self.is_playing();
        if started {
            // a fresh request gets a fresh run of retries
            self.failures = 0;
        }
        self.pending.push_back(track);

        Enqueued {
            position: self.pending.len() + usize::from(self.is_playing()),
            started,
        }
    }

    /// Applies a terminal lifecycle event. Returns the track it ended, or `None`
    /// when the event belongs to some other (stale) play and must be ignored.
    pub fn finish(&mut self, play_id: PlayId, event: &PlaybackEvent) -> Option<TrackMetadata> {
        let ended = self.current.take_if(|now| now.play_id == play_id)?;
        self.paused = false;
        match event {
            PlaybackEvent::Errored(_) => self.failures += 1,
            PlaybackEvent::Finished | PlaybackEvent::Stopped => self.failures = 0,
        }
        Some(ended.track)
    }

    /// Moves the head of the pending sequence into the current slot, discarding
    /// whatever was current before.
    pub fn advance(&mut self, play_id: PlayId) -> Advance {
        self.current = None;
        self.paused = false;

        if self.failures >= MAX_CONSECUTIVE_FAILURES && !self.pending.is_empty() {
            let failures = std::mem::take(&mut self.failures);
            let dropped = self.pending.len();
            self.pending.clear();
            return Advance::GaveUp { failures, dropped };
        }

        match self.pending.pop_front() {
            Some(track) => {
                self.current = Some(NowPlaying {
                    play_id,
                    track: track.clone(),
                });
                Advance::Play { play_id, track }
            }
            None => {
                self.failures = 0;
                Advance::Drained
            }
        }
    }

    pub fn ensure_pausable(&self) -> MusicResult<&TrackMetadata> {
        let track = self.current_track().ok_or(MusicError::NotPlaying)?;
        if self.paused {
            return Err(MusicError::AlreadyPaused);
        }
        Ok(track)
    }

    pub fn ensure_resumable(&self) -> MusicResult<&TrackMetadata> {
        let track = self.current_track().ok_or(MusicError::NotPlaying)?;
        if !self.paused {
            return Err(MusicError::NotPaused);
        }
        Ok(track)
    }

    /// Records a pause/resume the transport has carried out.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused && self.is_playing();
    }

    /// Randomises the order of the pending tracks. Returns how many were shuffled.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> MusicResult<usize> {
        if self.pending.is_empty() {
            return Err(MusicError::EmptyQueue);
        }
        self.pending.make_contiguous().shuffle(rng);
        Ok(self.pending.len())
    }

    /// Removes the pending track at 1-based `position` in the up-next list.
    pub fn remove(&mut self, position: usize) -> MusicResult<TrackMetadata> {
        if self.pending.is_empty() {
            return Err(MusicError::EmptyQueue);
        }
        position
            .checked_sub(1)
            .and_then(|index| self.pending.remove(index))
            .ok_or(MusicError::InvalidPosition(self.pending.len()))
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current_track().cloned(),
            pending: self.pending.iter().cloned().collect(),
            paused: self.paused,
            voice_channel: self.voice_channel,
        }
    }
}
