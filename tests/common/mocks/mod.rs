//! Mock implementations for external dependencies
//! This module contains mock objects used for testing

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serenity::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use woki_dj::commands::music::audio_sources::{
    CatalogEntry, CatalogPlaylistReader, Resolver, Track,
};
use woki_dj::commands::music::utils::music_manager::{MusicError, MusicResult};
use woki_dj::commands::music::utils::queue_manager::{PlaybackId, PlaybackSink};
use woki_dj::commands::music::utils::session::SessionMailbox;

#[derive(Default)]
struct SinkState {
    started: Vec<(PlaybackId, String)>,
    stops: usize,
    playing: Option<PlaybackId>,
    refused: HashSet<String>,
    mailbox: Option<SessionMailbox>,
}

impl SinkState {
    /// Ends the current playback the way a voice driver would.
    fn finish(&mut self) -> bool {
        let Some(playback) = self.playing.take() else {
            return false;
        };
        if let Some(mailbox) = &self.mailbox {
            mailbox.notify_finished(playback);
        }
        true
    }
}

/// Sink that records what it is asked to play.
///
/// When attached to a session it reports completions through the mailbox,
/// both on `stop` and when a test calls `SinkProbe::finish_current`.
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

/// Test-side view of a `RecordingSink` that has been moved into an engine.
#[derive(Clone)]
pub struct SinkProbe {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> (Self, SinkProbe) {
        let state = Arc::new(Mutex::new(SinkState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            SinkProbe { state },
        )
    }

    pub fn attached(mailbox: SessionMailbox) -> (Self, SinkProbe) {
        let (sink, probe) = Self::new();
        sink.state.lock().unwrap().mailbox = Some(mailbox);
        (sink, probe)
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    async fn start(&mut self, track: &Track, playback: PlaybackId) -> MusicResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.refused.contains(track.title()) {
            return Err(MusicError::SinkStart(format!(
                "cannot stream {}",
                track.media_ref()
            )));
        }
        state.started.push((playback, track.title().to_string()));
        state.playing = Some(playback);
        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        state.finish();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing.is_some()
    }
}

impl SinkProbe {
    pub fn started_titles(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.started.iter().map(|(_, title)| title.clone()).collect()
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn playing(&self) -> Option<PlaybackId> {
        self.state.lock().unwrap().playing
    }

    /// Id of the most recent successful start.
    pub fn last_started(&self) -> Option<PlaybackId> {
        self.state.lock().unwrap().started.last().map(|(id, _)| *id)
    }

    /// Makes `start` fail for tracks with this title.
    pub fn refuse(&self, title: &str) {
        self.state.lock().unwrap().refused.insert(title.to_string());
    }

    /// Delivers a completion signal for `playback`, current or not.
    pub fn notify_finished(&self, playback: PlaybackId) -> bool {
        let state = self.state.lock().unwrap();
        state
            .mailbox
            .as_ref()
            .is_some_and(|mailbox| mailbox.notify_finished(playback))
    }

    /// Lets the current track run out. Returns false if nothing was playing.
    pub fn finish_current(&self) -> bool {
        self.state.lock().unwrap().finish()
    }

    /// Breaks the current track off with `reason`, as a dead stream would.
    pub fn fail_current(&self, reason: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(playback) = state.playing.take() else {
            return false;
        };
        state
            .mailbox
            .as_ref()
            .is_some_and(|mailbox| mailbox.notify_failed(playback, reason.to_string()))
    }
}

/// Resolver answering from fixed tables. Anything unknown is `NotFound`.
#[derive(Default)]
pub struct StubResolver {
    searches: HashMap<String, MusicResult<Track>>,
    entries: HashMap<String, MusicResult<Track>>,
    calls: Mutex<Vec<String>>,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, result: MusicResult<Track>) -> Self {
        self.searches.insert(query.to_string(), result);
        self
    }

    /// Resolves the catalog entry with this id.
    pub fn with_entry(mut self, id: &str, result: MusicResult<Track>) -> Self {
        self.entries.insert(id.to_string(), result);
        self
    }

    /// Queries and entry ids, in the order they were resolved.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for StubResolver {
    async fn resolve_search(&self, query: &str) -> MusicResult<Track> {
        self.calls.lock().unwrap().push(query.to_string());
        self.searches
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(MusicError::NotFound(query.to_string())))
    }

    async fn resolve_catalog_entry(&self, entry: &CatalogEntry) -> MusicResult<Track> {
        self.calls.lock().unwrap().push(entry.id.clone());
        self.entries
            .get(&entry.id)
            .cloned()
            .unwrap_or_else(|| Err(MusicError::NotFound(entry.label())))
    }
}

/// Playlist reader serving a fixed listing.
pub struct StaticPlaylistReader {
    items: Vec<MusicResult<CatalogEntry>>,
}

impl StaticPlaylistReader {
    pub fn new(items: Vec<MusicResult<CatalogEntry>>) -> Self {
        Self { items }
    }
}

impl CatalogPlaylistReader for StaticPlaylistReader {
    fn list_tracks<'a>(
        &'a self,
        _playlist_id: &'a str,
        max_items: usize,
    ) -> BoxStream<'a, MusicResult<CatalogEntry>> {
        stream::iter(self.items.iter().cloned()).take(max_items).boxed()
    }
}
