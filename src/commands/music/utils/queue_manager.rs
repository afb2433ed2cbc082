//! The playback queue of one session and its advancement protocol.
//!
//! `QueueEngine` owns the pending tracks and the currently playing one. It is
//! driven from a single logical control flow (see `session`): commands call
//! into it, and the sink's completion signal comes back as `on_finished`.
//! Advancement is an iterative "pop one, start one" step; a track the sink
//! cannot start is reported and skipped, never retried.

use rand::seq::SliceRandom;
use serenity::async_trait;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::Track;

/// Identifies one `start` call on a sink. Completion signals carry it back so
/// late or duplicate signals for an earlier track can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(u64);

impl PlaybackId {
    pub fn get(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
}

/// Things the command layer may want to tell users about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    NowPlaying(Track),
    TrackEnded { track: Track, skipped: bool },
    StartFailed { track: Track, reason: String },
    /// A track that had started broke off before its end.
    PlaybackFailed { track: Track, reason: String },
    /// Advancement found nothing left to play.
    QueueDrained,
}

/// A read-only page of the pending queue, for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueuePage {
    /// `(1-based position, title)` pairs.
    pub entries: Vec<(usize, String)>,
    /// The page actually served, after clamping.
    pub page_index: usize,
    pub total_pages: usize,
    pub total_tracks: usize,
}

/// Something that can stream a track's media reference.
///
/// After a successful `start`, the sink must eventually report completion for
/// that `PlaybackId` exactly once, whether the track ran out or was stopped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackSink: Send {
    async fn start(&mut self, track: &Track, playback: PlaybackId) -> MusicResult<()>;

    async fn stop(&mut self) -> MusicResult<()>;

    fn is_playing(&self) -> bool;
}

struct CurrentTrack {
    playback: PlaybackId,
    track: Track,
    skip_requested: bool,
}

pub struct QueueEngine<S> {
    queue: VecDeque<Track>,
    current: Option<CurrentTrack>,
    sink: S,
    capacity: Option<usize>,
    last_playback: u64,
    events: Vec<PlaybackEvent>,
}

impl<S: PlaybackSink> QueueEngine<S> {
    /// `capacity` bounds the pending queue; `None` leaves it unbounded.
    pub fn new(sink: S, capacity: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            sink,
            capacity,
            last_playback: 0,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.current.is_some() {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Idle
        }
    }

    pub fn now_playing(&self) -> Option<&Track> {
        self.current.as_ref().map(|current| &current.track)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Appends a track to the end of the queue and returns the new queue
    /// length. Does not start playback; call `advance_if_idle` afterwards.
    pub fn enqueue(&mut self, track: Track) -> MusicResult<usize> {
        if self.capacity.is_some_and(|cap| self.queue.len() >= cap) {
            warn!("Queue full, rejecting '{}'", track.title());
            return Err(MusicError::QueueFull(self.queue.len()));
        }

        debug!("Enqueued '{}'", track.title());
        self.queue.push_back(track);
        Ok(self.queue.len())
    }

    /// Starts the next pending track unless something is already playing.
    ///
    /// Tracks the sink refuses are dropped with a `StartFailed` event and the
    /// next one is tried. Emits `QueueDrained` when nothing could be started.
    pub async fn advance_if_idle(&mut self) {
        if let Some(current) = &self.current {
            debug!(
                "Already playing '{}' ({}), not advancing",
                current.track.title(),
                current.playback
            );
            return;
        }

        while let Some(track) = self.queue.pop_front() {
            self.last_playback += 1;
            let playback = PlaybackId(self.last_playback);

            match self.sink.start(&track, playback).await {
                Ok(()) => {
                    info!("Now playing '{}' ({})", track.title(), playback);
                    self.events.push(PlaybackEvent::NowPlaying(track.clone()));
                    self.current = Some(CurrentTrack {
                        playback,
                        track,
                        skip_requested: false,
                    });
                    return;
                }
                Err(err) => {
                    warn!("Skipping '{}', sink failed to start: {}", track.title(), err);
                    self.events.push(PlaybackEvent::StartFailed {
                        track,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!("No more songs in the queue");
        self.events.push(PlaybackEvent::QueueDrained);
    }

    /// Completion signal from the sink. Signals for anything but the current
    /// playback are ignored.
    pub async fn on_finished(&mut self, playback: PlaybackId) {
        self.complete(playback, None).await;
    }

    /// Like `on_finished`, for a playback the sink reports as broken off.
    pub async fn on_failed(&mut self, playback: PlaybackId, reason: String) {
        self.complete(playback, Some(reason)).await;
    }

    async fn complete(&mut self, playback: PlaybackId, failure: Option<String>) {
        let Some(finished) = self
            .current
            .take_if(|current| current.playback == playback)
        else {
            debug!("Ignoring completion of stale {}", playback);
            return;
        };

        let event = match failure {
            Some(reason) => {
                warn!(
                    "'{}' ({}) failed during playback: {}",
                    finished.track.title(),
                    playback,
                    reason
                );
                PlaybackEvent::PlaybackFailed {
                    track: finished.track,
                    reason,
                }
            }
            None => {
                info!(
                    "Finished '{}' ({}, skipped: {})",
                    finished.track.title(),
                    playback,
                    finished.skip_requested
                );
                PlaybackEvent::TrackEnded {
                    track: finished.track,
                    skipped: finished.skip_requested,
                }
            }
        };
        self.events.push(event);

        self.advance_if_idle().await;
    }

    /// Asks the sink to stop the current track. The next track starts when the
    /// sink reports completion. Returns the track being skipped.
    pub async fn skip_current(&mut self) -> MusicResult<Track> {
        let track = match self.current.as_mut() {
            Some(current) => {
                current.skip_requested = true;
                current.track.clone()
            }
            None => return Err(MusicError::NotPlaying),
        };

        // A sink that already stopped has its completion signal in flight.
        if self.sink.is_playing() {
            self.sink.stop().await?;
        }

        info!("Skip requested for '{}'", track.title());
        Ok(track)
    }

    /// Removes every pending track. The current track keeps playing.
    pub fn clear(&mut self) -> usize {
        let removed = self.queue.len();
        self.queue.clear();
        info!("Cleared {} pending tracks", removed);
        removed
    }

    /// Randomly reorders the pending tracks, then starts playback if idle.
    pub async fn shuffle(&mut self) -> MusicResult<()> {
        if self.queue.is_empty() {
            return Err(MusicError::EmptyQueue);
        }

        self.queue.make_contiguous().shuffle(&mut rand::rng());
        info!("Shuffled {} pending tracks", self.queue.len());

        self.advance_if_idle().await;
        Ok(())
    }

    /// Returns one page of the pending queue. `page_size` of zero is treated
    /// as one and `page_index` is clamped to the last page.
    pub fn snapshot(&self, page_size: usize, page_index: usize) -> QueuePage {
        let page_size = page_size.max(1);
        let total_tracks = self.queue.len();
        let total_pages = total_tracks.div_ceil(page_size);
        let page_index = page_index.min(total_pages.saturating_sub(1));

        let entries = self
            .queue
            .iter()
            .enumerate()
            .skip(page_index * page_size)
            .take(page_size)
            .map(|(index, track)| (index + 1, track.title().to_string()))
            .collect();

        QueuePage {
            entries,
            page_index,
            total_pages,
            total_tracks,
        }
    }

    /// Stops playback and forgets every track. The engine is `Idle` afterwards.
    pub async fn shutdown(&mut self) {
        self.queue.clear();
        if let Some(current) = self.current.take() {
            info!("Stopping '{}' for shutdown", current.track.title());
            if let Err(err) = self.sink.stop().await {
                warn!("Failed to stop sink during shutdown: {}", err);
            }
        }
    }

    /// Takes the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }
}
