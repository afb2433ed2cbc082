use serenity::async_trait;
use serenity::model::id::GuildId;
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext, EventHandler};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::queue_manager::PlaybackId;
use super::session::{SessionMailbox, SessionRegistry};

/// Reports the end of one playback to its session.
///
/// Registered for both `End` and `Error`; only the first of them for a given
/// playback gets through.
#[derive(Clone)]
pub struct TrackEndNotifier {
    playback: PlaybackId,
    active: Arc<AtomicU64>,
    mailbox: SessionMailbox,
}

impl TrackEndNotifier {
    pub fn new(playback: PlaybackId, active: Arc<AtomicU64>, mailbox: SessionMailbox) -> Self {
        Self {
            playback,
            active,
            mailbox,
        }
    }

    /// Hands the completion to the session unless another event for the same
    /// playback already did. Returns whether this call claimed it.
    fn report(&self, failure: Option<String>) -> bool {
        let claimed = self
            .active
            .compare_exchange(self.playback.get(), 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !claimed {
            return false;
        }

        let delivered = match failure {
            Some(reason) => self.mailbox.notify_failed(self.playback, reason),
            None => self.mailbox.notify_finished(self.playback),
        };
        if !delivered {
            debug!("Session for {} is already gone", self.playback);
        }
        true
    }
}

fn failure_reason(ctx: &EventContext<'_>) -> Option<String> {
    let EventContext::Track(tracks) = ctx else {
        return None;
    };
    tracks.iter().find_map(|(state, _)| match &state.playing {
        PlayMode::Errored(e) => Some(e.to_string()),
        _ => None,
    })
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let failure = failure_reason(ctx);
        if let Some(reason) = &failure {
            warn!("{} ended with an error: {}", self.playback, reason);
        }

        self.report(failure);
        None
    }
}

/// Closes the guild's session when the voice connection drops.
pub struct VoiceDisconnectNotifier {
    pub guild_id: GuildId,
    pub sessions: Arc<SessionRegistry>,
}

#[async_trait]
impl EventHandler for VoiceDisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            info!(
                "Voice connection lost in guild {} ({:?}), closing session",
                self.guild_id, data.reason
            );
            self.sessions.close(self.guild_id).await;
        }
        None
    }
}
