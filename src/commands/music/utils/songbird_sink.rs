use serenity::async_trait;
use songbird::input::YoutubeDl;
use songbird::tracks::{ControlError, TrackHandle};
use songbird::{Call, Event, TrackEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::event_handlers::TrackEndNotifier;
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::{PlaybackId, PlaybackSink};
use super::session::SessionMailbox;
use crate::commands::music::audio_sources::Track;

/// Plays tracks into a guild's voice call.
///
/// `active` holds the id of the playback whose completion is still owed to the
/// session, or 0 when there is none.
pub struct SongbirdSink {
    call: Arc<Mutex<Call>>,
    http_client: reqwest::Client,
    mailbox: SessionMailbox,
    active: Arc<AtomicU64>,
    current: Option<TrackHandle>,
}

impl SongbirdSink {
    pub fn new(
        call: Arc<Mutex<Call>>,
        http_client: reqwest::Client,
        mailbox: SessionMailbox,
    ) -> Self {
        Self {
            call,
            http_client,
            mailbox,
            active: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }
}

/// Anything a sink can ask to stop.
trait Stoppable {
    fn stop(&self) -> Result<(), ControlError>;
}

impl Stoppable for TrackHandle {
    fn stop(&self) -> Result<(), ControlError> {
        TrackHandle::stop(self)
    }
}

/// Stops `handle`, putting it back into `slot` when the driver refused so a
/// later skip can try again.
fn stop_handle<H: Stoppable>(slot: &mut Option<H>, handle: H) -> MusicResult<()> {
    match handle.stop() {
        Ok(()) | Err(ControlError::Finished) => Ok(()),
        Err(e) => {
            error!("Failed to stop the current track: {}", e);
            *slot = Some(handle);
            Err(MusicError::PlaybackControl(e.to_string()))
        }
    }
}

#[async_trait]
impl PlaybackSink for SongbirdSink {
    async fn start(&mut self, track: &Track, playback: PlaybackId) -> MusicResult<()> {
        let url = url::Url::parse(track.media_ref()).map_err(|e| {
            MusicError::SinkStart(format!("Invalid media reference '{}': {}", track.media_ref(), e))
        })?;

        let source = YoutubeDl::new(self.http_client.clone(), url.to_string());
        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(source.into())
        };

        self.active.store(playback.get(), Ordering::SeqCst);

        let notifier = TrackEndNotifier::new(playback, Arc::clone(&self.active), self.mailbox.clone());
        let registered = handle
            .add_event(Event::Track(TrackEvent::End), notifier.clone())
            .and_then(|_| handle.add_event(Event::Track(TrackEvent::Error), notifier));

        if let Err(e) = registered {
            error!("Failed to watch {} for completion: {}", playback, e);
            let _ = handle.stop();
            self.active.store(0, Ordering::SeqCst);
            return Err(MusicError::SinkStart(e.to_string()));
        }

        debug!("Started {} for '{}'", playback, track.title());
        self.current = Some(handle);
        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        let Some(handle) = self.current.take() else {
            return Ok(());
        };

        stop_handle(&mut self.current, handle)
    }

    fn is_playing(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }
}
