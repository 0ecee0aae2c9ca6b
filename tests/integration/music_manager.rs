use assert_matches::assert_matches;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use viby::commands::music::utils::music_manager::{Invoker, Queued};
use viby::{MusicError, MusicManager, ResolveError};

use crate::common::Harness;
use crate::common::fixtures::{guild, other_voice, text, track, user, voice};
use crate::common::mocks::{MockResolver, TransportCall};

fn invoker_in(voice_channel: Option<serenity::model::id::ChannelId>) -> Invoker {
    Invoker {
        guild_id: guild(),
        user_id: user(),
        voice_channel,
        text_channel: text(),
    }
}

/// A resolver that turns every query into a track titled after it.
fn echo_resolver() -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(|query, _| Ok(track(query)));
    resolver
}

fn manager(h: &Harness, resolver: MockResolver) -> MusicManager {
    MusicManager::new(h.registry.clone(), Arc::new(resolver))
}

#[tokio::test]
async fn test_play_resolves_and_queues() {
    let h = Harness::new();
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .with(eq("never gonna give you up"), eq(user()))
        .times(1)
        .returning(|_, _| Ok(track("Never Gonna Give You Up")));
    let music = manager(&h, resolver);

    let queued = music
        .play(&invoker_in(Some(voice())), "never gonna give you up")
        .await
        .unwrap();

    assert_eq!(
        queued,
        Queued {
            track: track("Never Gonna Give You Up"),
            position: 1,
            started: true,
        }
    );
    assert_eq!(h.transport.played(), vec!["Never Gonna Give You Up"]);
}

#[tokio::test]
async fn test_play_requires_a_voice_channel() {
    let h = Harness::new();
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let music = manager(&h, resolver);

    assert_matches!(
        music.play(&invoker_in(None), "anything").await,
        Err(MusicError::NotInVoiceChannel)
    );
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_play_from_another_channel_is_rejected_before_resolving() {
    let h = Harness::new();
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .times(1)
        .returning(|query, _| Ok(track(query)));
    let music = manager(&h, resolver);

    music.play(&invoker_in(Some(voice())), "A").await.unwrap();
    assert_matches!(
        music.play(&invoker_in(Some(other_voice())), "B").await,
        Err(MusicError::WrongVoiceChannel)
    );
}

#[rstest]
#[case(ResolveError::NotFound("zzz".into()), MusicError::NotFound("zzz".into()))]
#[case(
    ResolveError::TimedOut(Duration::from_secs(30)),
    MusicError::ResolutionError("Resolution timed out after 30s".into())
)]
#[case(
    ResolveError::Failed("HTTP Error 403".into()),
    MusicError::ResolutionError("Resolution failed: HTTP Error 403".into())
)]
#[tokio::test]
async fn test_resolver_errors_leave_no_state(
    #[case] failure: ResolveError,
    #[case] expected: MusicError,
) {
    let h = Harness::new();
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(move |_, _| Err(failure.clone()));
    let music = manager(&h, resolver);

    assert_eq!(music.play(&invoker_in(Some(voice())), "zzz").await, Err(expected));
    assert_eq!(h.registry.snapshot(guild()).await, None);
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_controls_check_the_callers_channel() {
    let h = Harness::new();
    let music = manager(&h, echo_resolver());
    music.play(&invoker_in(Some(voice())), "A").await.unwrap();

    let elsewhere = invoker_in(Some(other_voice()));
    assert_matches!(music.pause(&elsewhere).await, Err(MusicError::WrongVoiceChannel));
    assert_matches!(music.skip(&elsewhere).await, Err(MusicError::WrongVoiceChannel));
    assert_matches!(music.stop(&elsewhere).await, Err(MusicError::WrongVoiceChannel));

    let absent = invoker_in(None);
    assert_matches!(music.resume(&absent).await, Err(MusicError::NotInVoiceChannel));
    assert_matches!(music.shuffle(&absent).await, Err(MusicError::NotInVoiceChannel));

    assert_eq!(h.transport.count(&TransportCall::Stop(guild())), 0);
    assert!(h.registry.snapshot(guild()).await.is_some());
}

#[tokio::test]
async fn test_controls_without_playback() {
    let h = Harness::new();
    let music = manager(&h, echo_resolver());
    let here = invoker_in(Some(voice()));

    assert_matches!(music.pause(&here).await, Err(MusicError::NotPlaying));
    assert_matches!(music.resume(&here).await, Err(MusicError::NotPlaying));
    assert_matches!(music.skip(&here).await, Err(MusicError::NotPlaying));
    assert_matches!(music.stop(&here).await, Err(MusicError::NotPlaying));
    assert_matches!(music.remove(&here, 1).await, Err(MusicError::NotPlaying));
    assert_matches!(music.queue(guild()).await, Err(MusicError::EmptyQueue));
    assert_matches!(music.now_playing(guild()).await, Err(MusicError::NotPlaying));
}

#[tokio::test]
async fn test_toggle_pause_flips_state() {
    let h = Harness::new();
    let music = manager(&h, echo_resolver());
    let here = invoker_in(Some(voice()));
    music.play(&here, "A").await.unwrap();

    assert!(music.toggle_pause(&here).await.unwrap());
    assert!(music.now_playing(guild()).await.unwrap().paused);
    assert!(!music.toggle_pause(&here).await.unwrap());
    assert!(!music.now_playing(guild()).await.unwrap().paused);
}

#[tokio::test]
async fn test_queue_and_now_playing_are_snapshots() {
    let h = Harness::new();
    let music = manager(&h, echo_resolver());
    let here = invoker_in(Some(voice()));
    for query in ["A", "B", "C"] {
        music.play(&here, query).await.unwrap();
    }

    let now = music.now_playing(guild()).await.unwrap();
    assert_eq!(now.track, track("A"));
    assert_eq!(now.upcoming, 2);

    let mut snapshot = music.queue(guild()).await.unwrap();
    snapshot.pending.clear();
    // mutating the copy leaves the real queue alone
    assert_eq!(music.queue(guild()).await.unwrap().pending.len(), 2);

    assert_eq!(music.remove(&here, 1).await.unwrap(), track("B"));
    let summary = music.stop(&here).await.unwrap();
    assert_eq!(summary.cleared, 1);
    assert_matches!(music.queue(guild()).await, Err(MusicError::EmptyQueue));
}
