//! One playback session per guild, run as a task that owns its `QueueEngine`.
//!
//! Commands and sink completion signals reach the engine through a single
//! mailbox, so engine operations never interleave.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serenity::model::id::GuildId;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::{PlaybackEvent, PlaybackId, PlaybackSink, QueueEngine, QueuePage};
use crate::commands::music::audio_sources::Track;

type Reply<T> = oneshot::Sender<T>;

pub(crate) enum SessionCommand {
    Enqueue {
        track: Track,
        reply: Reply<MusicResult<usize>>,
    },
    AdvanceIfIdle,
    Skip {
        reply: Reply<MusicResult<Track>>,
    },
    Clear {
        reply: Reply<usize>,
    },
    Shuffle {
        reply: Reply<MusicResult<()>>,
    },
    Snapshot {
        page_size: usize,
        page_index: usize,
        reply: Reply<QueuePage>,
    },
    NowPlaying {
        reply: Reply<Option<Track>>,
    },
    Finished(PlaybackId),
    Failed {
        playback: PlaybackId,
        reason: String,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Lets a sink report completions back to its session without keeping the
/// session alive.
#[derive(Clone)]
pub struct SessionMailbox {
    commands: mpsc::WeakUnboundedSender<SessionCommand>,
}

impl SessionMailbox {
    /// Returns false once the session is gone.
    pub fn notify_finished(&self, playback: PlaybackId) -> bool {
        self.deliver(SessionCommand::Finished(playback))
    }

    /// Reports a playback that broke off with an error. Returns false once the
    /// session is gone.
    pub fn notify_failed(&self, playback: PlaybackId, reason: String) -> bool {
        self.deliver(SessionCommand::Failed { playback, reason })
    }

    fn deliver(&self, command: SessionCommand) -> bool {
        match self.commands.upgrade() {
            Some(commands) => commands.send(command).is_ok(),
            None => false,
        }
    }

    /// A mailbox wired to a bare channel instead of a session task.
    #[cfg(test)]
    pub(crate) fn detached() -> (
        Self,
        mpsc::UnboundedSender<SessionCommand>,
        mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mailbox = Self {
            commands: tx.downgrade(),
        };
        (mailbox, tx, rx)
    }
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Spawns the session task. `make_sink` receives the mailbox the sink must
    /// use to report completions. Engine events are delivered on the returned
    /// receiver.
    pub fn spawn<S, F>(
        capacity: Option<usize>,
        make_sink: F,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>)
    where
        S: PlaybackSink + 'static,
        F: FnOnce(SessionMailbox) -> S,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sink = make_sink(SessionMailbox {
            commands: cmd_tx.downgrade(),
        });
        let engine = QueueEngine::new(sink, capacity);
        tokio::spawn(run(engine, cmd_rx, event_tx));

        (Self { commands: cmd_tx }, event_rx)
    }

    fn send(&self, command: SessionCommand) -> MusicResult<()> {
        self.commands
            .send(command)
            .map_err(|_| MusicError::SessionClosed)
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> SessionCommand) -> MusicResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| MusicError::SessionClosed)
    }

    /// Adds a track and returns the resulting queue length.
    pub async fn enqueue(&self, track: Track) -> MusicResult<usize> {
        self.request(|reply| SessionCommand::Enqueue { track, reply })
            .await?
    }

    /// Fire-and-forget; the outcome shows up as events.
    pub fn advance_if_idle(&self) -> MusicResult<()> {
        self.send(SessionCommand::AdvanceIfIdle)
    }

    /// Enqueue followed by `advance_if_idle`, the way every command adds tracks.
    pub async fn enqueue_and_advance(&self, track: Track) -> MusicResult<usize> {
        let position = self.enqueue(track).await?;
        self.advance_if_idle()?;
        Ok(position)
    }

    pub async fn skip(&self) -> MusicResult<Track> {
        self.request(|reply| SessionCommand::Skip { reply }).await?
    }

    pub async fn clear(&self) -> MusicResult<usize> {
        self.request(|reply| SessionCommand::Clear { reply }).await
    }

    pub async fn shuffle(&self) -> MusicResult<()> {
        self.request(|reply| SessionCommand::Shuffle { reply })
            .await?
    }

    pub async fn snapshot(&self, page_size: usize, page_index: usize) -> MusicResult<QueuePage> {
        self.request(|reply| SessionCommand::Snapshot {
            page_size,
            page_index,
            reply,
        })
        .await
    }

    pub async fn now_playing(&self) -> MusicResult<Option<Track>> {
        self.request(|reply| SessionCommand::NowPlaying { reply })
            .await
    }

    /// Stops playback and ends the session task.
    pub async fn shutdown(&self) -> MusicResult<()> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

async fn run<S: PlaybackSink>(
    mut engine: QueueEngine<S>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) {
    debug!("Session task started");

    while let Some(command) = commands.recv().await {
        let stop = match command {
            SessionCommand::Enqueue { track, reply } => {
                let _ = reply.send(engine.enqueue(track));
                false
            }
            SessionCommand::AdvanceIfIdle => {
                engine.advance_if_idle().await;
                false
            }
            SessionCommand::Skip { reply } => {
                let _ = reply.send(engine.skip_current().await);
                false
            }
            SessionCommand::Clear { reply } => {
                let _ = reply.send(engine.clear());
                false
            }
            SessionCommand::Shuffle { reply } => {
                let _ = reply.send(engine.shuffle().await);
                false
            }
            SessionCommand::Snapshot {
                page_size,
                page_index,
                reply,
            } => {
                let _ = reply.send(engine.snapshot(page_size, page_index));
                false
            }
            SessionCommand::NowPlaying { reply } => {
                let _ = reply.send(engine.now_playing().cloned());
                false
            }
            SessionCommand::Finished(playback) => {
                engine.on_finished(playback).await;
                false
            }
            SessionCommand::Failed { playback, reason } => {
                engine.on_failed(playback, reason).await;
                false
            }
            SessionCommand::Shutdown { reply } => {
                // Handles see the session as closed from here on.
                commands.close();
                engine.shutdown().await;
                let _ = reply.send(());
                true
            }
        };

        for event in engine.drain_events() {
            // Nobody listening is fine.
            let _ = events.send(event);
        }

        if stop {
            break;
        }
    }

    engine.shutdown().await;
    debug!("Session task stopped");
}

/// The live sessions, keyed by guild.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions
            .get(&guild_id)
            .filter(|session| !session.is_closed())
            .map(|session| session.clone())
    }

    /// Returns the guild's session, creating it with `create` if there is none
    /// or the previous one has ended.
    pub fn get_or_create(
        &self,
        guild_id: GuildId,
        create: impl FnOnce() -> SessionHandle,
    ) -> SessionHandle {
        match self.sessions.entry(guild_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    debug!("Replacing ended session for guild {}", guild_id);
                    entry.insert(create());
                }
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry.insert(create()).value().clone(),
        }
    }

    /// Shuts the guild's session down and forgets it. Returns whether there
    /// was one.
    pub async fn close(&self, guild_id: GuildId) -> bool {
        let Some((_, session)) = self.sessions.remove(&guild_id) else {
            return false;
        };

        info!("Closing playback session for guild {}", guild_id);
        // Already stopped is fine.
        let _ = session.shutdown().await;
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
