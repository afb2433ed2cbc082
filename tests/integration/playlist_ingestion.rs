use assert_matches::assert_matches;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

use woki_dj::commands::music::audio_sources::CatalogPlaylistReader;
use woki_dj::commands::music::utils::music_manager::MusicError;
use woki_dj::commands::music::utils::session::SessionHandle;
use woki_dj::commands::music::utils::song_fetchers::{IngestReport, ingest_playlist};

use crate::common::fixtures::{catalog_entry, track};
use crate::common::mocks::{RecordingSink, SinkProbe, StaticPlaylistReader, StubResolver};
use crate::common::{page_titles, settle};

fn spawn_session(capacity: Option<usize>) -> (SessionHandle, SinkProbe) {
    let probe = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&probe);
    let (session, _events) = SessionHandle::spawn(capacity, move |mailbox| {
        let (sink, probe) = RecordingSink::attached(mailbox);
        *slot.lock().unwrap() = Some(probe);
        sink
    });
    let probe = probe.lock().unwrap().take().unwrap();
    (session, probe)
}

fn three_song_playlist() -> StaticPlaylistReader {
    StaticPlaylistReader::new(vec![
        Ok(catalog_entry("1", "One", "Band")),
        Ok(catalog_entry("2", "Two", "Band")),
        Ok(catalog_entry("3", "Three", "Band")),
    ])
}

#[tokio::test]
async fn entries_are_queued_in_catalog_order_and_playback_starts() {
    let (session, probe) = spawn_session(None);
    let resolver = StubResolver::new()
        .with_entry("1", Ok(track("One")))
        .with_entry("2", Ok(track("Two")))
        .with_entry("3", Ok(track("Three")));
    let reader = three_song_playlist();

    let report = ingest_playlist(reader.list_tracks("PL", 25), &resolver, &session)
        .await
        .unwrap();
    settle(&session).await;

    assert_eq!(
        report,
        IngestReport {
            added: 3,
            ..Default::default()
        }
    );
    assert_eq!(resolver.calls(), vec!["1", "2", "3"]);
    assert_eq!(probe.started_titles(), vec!["One"]);
    assert_eq!(
        page_titles(&session.snapshot(10, 0).await.unwrap()),
        vec!["Two", "Three"]
    );
}

#[tokio::test]
async fn unresolvable_entries_are_reported_and_skipped() {
    let (session, _probe) = spawn_session(None);
    let resolver = StubResolver::new()
        .with_entry("1", Ok(track("One")))
        .with_entry(
            "2",
            Err(MusicError::ResolveTimeout(std::time::Duration::from_secs(30))),
        )
        .with_entry("3", Ok(track("Three")));
    let reader = StaticPlaylistReader::new(vec![
        Ok(catalog_entry("1", "One", "Band")),
        Ok(catalog_entry("2", "Two", "Band")),
        Ok(catalog_entry("3", "Three", "Band")),
        Ok(catalog_entry("4", "Missing", "Nobody")),
    ]);

    let report = ingest_playlist(reader.list_tracks("PL", 25), &resolver, &session)
        .await
        .unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.not_found, vec!["Band - Two", "Nobody - Missing"]);
    assert_eq!(report.listing_error, None);
}

#[tokio::test]
async fn listing_failure_keeps_what_was_added() {
    let (session, _probe) = spawn_session(None);
    let resolver = StubResolver::new().with_entry("1", Ok(track("One")));
    let reader = StaticPlaylistReader::new(vec![
        Ok(catalog_entry("1", "One", "Band")),
        Err(MusicError::ExternalApiError("quota exceeded".into())),
        Ok(catalog_entry("2", "Two", "Band")),
    ]);

    let report = ingest_playlist(reader.list_tracks("PL", 25), &resolver, &session)
        .await
        .unwrap();

    assert_eq!(report.added, 1);
    assert_matches!(report.listing_error, Some(MusicError::ExternalApiError(_)));
    assert_eq!(resolver.calls(), vec!["1"]);
}

#[tokio::test]
async fn full_queue_stops_ingestion() {
    let (session, _probe) = spawn_session(Some(1));
    let resolver = StubResolver::new()
        .with_entry("1", Ok(track("One")))
        .with_entry("2", Ok(track("Two")))
        .with_entry("3", Ok(track("Three")));

    // Fill the queue without starting playback.
    session.enqueue(track("Already queued")).await.unwrap();

    let report = ingest_playlist(
        three_song_playlist().list_tracks("PL", 25),
        &resolver,
        &session,
    )
    .await
    .unwrap();

    assert!(report.stopped_full);
    assert_eq!(resolver.calls(), vec!["1"]);
}

#[tokio::test]
async fn max_items_bounds_the_listing() {
    let reader = three_song_playlist();

    let ids: Vec<String> = reader
        .list_tracks("PL", 2)
        .map(|entry| entry.unwrap().id)
        .collect()
        .await;

    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn closed_session_aborts_ingestion() {
    let (session, _probe) = spawn_session(None);
    session.shutdown().await.unwrap();
    let resolver = StubResolver::new().with_entry("1", Ok(track("One")));

    let result = ingest_playlist(
        three_song_playlist().list_tracks("PL", 25),
        &resolver,
        &session,
    )
    .await;

    assert_matches!(result, Err(MusicError::SessionClosed));
}
