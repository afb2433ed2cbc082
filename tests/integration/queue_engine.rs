use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;

use woki_dj::commands::music::utils::music_manager::MusicError;
use woki_dj::commands::music::utils::queue_manager::{PlaybackEvent, PlaybackStatus, QueueEngine};

use crate::common::fixtures::{random_tracks, track};
use crate::common::mocks::{RecordingSink, SinkProbe};
use crate::common::page_titles;

fn engine() -> (QueueEngine<RecordingSink>, SinkProbe) {
    let (sink, probe) = RecordingSink::new();
    (QueueEngine::new(sink, None), probe)
}

/// Reports completion of whatever the sink is playing.
async fn finish(engine: &mut QueueEngine<RecordingSink>, probe: &SinkProbe) {
    let playback = probe.playing().expect("something should be playing");
    probe.finish_current();
    engine.on_finished(playback).await;
}

#[tokio::test]
async fn advance_twice_while_playing_changes_nothing() {
    let (mut engine, probe) = engine();
    engine.enqueue(track("A")).unwrap();
    engine.enqueue(track("B")).unwrap();
    engine.advance_if_idle().await;

    let before = engine.snapshot(10, 0);
    engine.advance_if_idle().await;
    engine.advance_if_idle().await;

    assert_eq!(engine.snapshot(10, 0), before);
    assert_eq!(probe.started_titles(), vec!["A"]);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(12)]
#[tokio::test]
async fn tracks_play_in_arrival_order(#[case] count: usize) {
    let (mut engine, probe) = engine();
    let tracks = random_tracks(count);
    for t in &tracks {
        engine.enqueue(t.clone()).unwrap();
        engine.advance_if_idle().await;
    }

    while engine.status() == PlaybackStatus::Playing {
        finish(&mut engine, &probe).await;
    }

    let expected: Vec<String> = tracks.iter().map(|t| t.title().to_string()).collect();
    assert_eq!(probe.started_titles(), expected);
}

#[tokio::test]
async fn shuffle_never_moves_the_playing_track() {
    let (mut engine, _probe) = engine();
    for title in ["A", "B", "C", "D"] {
        engine.enqueue(track(title)).unwrap();
    }
    engine.advance_if_idle().await;

    let expected: HashSet<String> = ["B", "C", "D"].map(String::from).into();
    for _ in 0..50 {
        engine.shuffle().await.unwrap();
        assert_eq!(engine.now_playing().map(|t| t.title()), Some("A"));
        let pending: HashSet<String> = page_titles(&engine.snapshot(10, 0)).into_iter().collect();
        assert_eq!(pending, expected);
    }
}

#[tokio::test]
async fn shuffle_produces_more_than_one_order() {
    let (mut engine, _probe) = engine();
    for t in random_tracks(6) {
        engine.enqueue(t).unwrap();
    }
    engine.advance_if_idle().await;

    let mut orders = HashSet::new();
    for _ in 0..50 {
        engine.shuffle().await.unwrap();
        orders.insert(page_titles(&engine.snapshot(10, 0)));
    }

    // 5! orderings; 50 shuffles landing on one of them is practically impossible.
    assert!(orders.len() > 1);
}

#[tokio::test]
async fn clear_during_playback_keeps_current_track() {
    let (mut engine, probe) = engine();
    for title in ["A", "B", "C"] {
        engine.enqueue(track(title)).unwrap();
    }
    engine.advance_if_idle().await;

    engine.clear();

    assert!(engine.snapshot(10, 0).entries.is_empty());
    assert_eq!(engine.now_playing().map(|t| t.title()), Some("A"));
    assert_eq!(probe.stops(), 0);

    finish(&mut engine, &probe).await;
    assert_eq!(engine.status(), PlaybackStatus::Idle);
    assert_eq!(probe.started_titles(), vec!["A"]);
}

#[test]
fn twenty_five_tracks_make_three_pages() {
    let (mut engine, _probe) = engine();
    for t in random_tracks(25) {
        engine.enqueue(t).unwrap();
    }

    assert_eq!(engine.snapshot(10, 0).total_pages, 3);

    let last = engine.snapshot(10, 2);
    assert_eq!(last.entries.len(), 5);
    assert_eq!(
        last.entries.iter().map(|(pos, _)| *pos).collect::<Vec<_>>(),
        vec![21, 22, 23, 24, 25]
    );
}

#[tokio::test]
async fn skip_when_idle_leaves_queue_alone() {
    let (mut engine, probe) = engine();
    engine.enqueue(track("A")).unwrap();

    assert_matches!(engine.skip_current().await, Err(MusicError::NotPlaying));
    assert_eq!(page_titles(&engine.snapshot(10, 0)), vec!["A"]);
    assert_eq!(probe.stops(), 0);
}

#[tokio::test]
async fn finished_track_hands_over_to_the_next() {
    let (mut engine, probe) = engine();
    engine.enqueue(track("A")).unwrap();
    engine.enqueue(track("B")).unwrap();
    engine.advance_if_idle().await;
    assert_eq!(probe.started_titles(), vec!["A"]);

    finish(&mut engine, &probe).await;

    assert_eq!(probe.started_titles(), vec!["A", "B"]);
    assert!(engine.snapshot(10, 0).entries.is_empty());
    assert_eq!(engine.now_playing().map(|t| t.title()), Some("B"));
}

#[tokio::test]
async fn broken_stream_is_reported_and_skipped() {
    let (mut engine, probe) = engine();
    probe.refuse("B");
    for title in ["A", "B", "C"] {
        engine.enqueue(track(title)).unwrap();
    }
    engine.advance_if_idle().await;
    engine.drain_events();

    finish(&mut engine, &probe).await;

    assert_eq!(probe.started_titles(), vec!["A", "C"]);
    let events = engine.drain_events();
    assert_matches!(
        events.as_slice(),
        [
            PlaybackEvent::TrackEnded { skipped: false, .. },
            PlaybackEvent::StartFailed { track, .. },
            PlaybackEvent::NowPlaying(next),
        ] if track.title() == "B" && next.title() == "C"
    );
}
