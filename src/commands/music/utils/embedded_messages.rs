use poise::CreateReply;
use serenity::all::{ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, Http};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    format_duration,
    music_manager::MusicError,
    queue_manager::{PlaybackEvent, QueuePage},
};
use crate::commands::music::audio_sources::{PlaylistSource, Track};
use crate::commands::music::utils::song_fetchers::IngestReport;

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;

fn error_embed(description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(description)
        .color(FAILURE)
}

/// Title linked to its media reference, when that is a URL.
fn track_link(track: &Track) -> String {
    if url::Url::parse(track.media_ref()).is_ok() {
        format!("[{}]({})", track.title(), track.media_ref())
    } else {
        format!("**{}**", track.title())
    }
}

fn duration_field(track: &Track) -> String {
    track
        .duration()
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string())
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &Track) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(track_link(track))
        .field("Duration", format!("`{}`", duration_field(track)), true)
        .color(SUCCESS)
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(track: &Track, position: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(format!("Added {}", track_link(track)))
            .field("Duration", format!("`{}`", duration_field(track)), true)
            .field("Position", format!("`#{}`", position), true)
            .color(SUCCESS),
    )
}

/// Body of the queue embed. Pure so it can be checked without Discord.
pub fn queue_page_description(now_playing: Option<&Track>, page: &QueuePage) -> String {
    let mut description = String::new();

    match now_playing {
        Some(track) => {
            description.push_str("**🎵 Now Playing**\n");
            description.push_str(&track_link(track));
            description.push_str("\n\n");
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if page.entries.is_empty() {
        description.push_str("**📭 Queue is empty**");
        return description;
    }

    description.push_str(&format!("**📋 Queue - {} tracks**\n", page.total_tracks));
    for (position, title) in &page.entries {
        description.push_str(&format!("`{}.` {}\n", position, title));
    }

    description
}

/// Create an embed for one page of the music queue
pub fn music_queue(now_playing: Option<&Track>, page: &QueuePage) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(queue_page_description(now_playing, page))
        .color(SUCCESS);

    if page.total_pages > 1 {
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "Page {}/{}",
            page.page_index + 1,
            page.total_pages
        )));
    }

    embed
}

/// Create an embed for when a user is not connected to a voice channel
pub fn user_not_in_voice_channel(err: MusicError) -> CreateReply {
    CreateReply::default()
        .embed(error_embed(format!(
            "You need to be in a voice channel: {}",
            err
        )))
        .ephemeral(true)
}

/// Create an embed for when the bot is not connected to a voice channel
pub fn bot_not_in_voice_channel() -> CreateReply {
    CreateReply::default().embed(error_embed("I'm not connected to a voice channel"))
}

/// Create an embed for when no track is playing
pub fn no_track_playing() -> CreateReply {
    CreateReply::default().embed(error_embed("No track is currently playing"))
}

/// Create an embed for when the queue is empty
pub fn queue_is_empty() -> CreateReply {
    CreateReply::default().embed(error_embed("The queue is empty"))
}

pub fn queue_full(capacity: usize) -> CreateReply {
    CreateReply::default().embed(error_embed(format!(
        "The queue is full ({} tracks). Try again once some have played",
        capacity
    )))
}

pub fn no_results(query: &str) -> CreateReply {
    CreateReply::default().embed(error_embed(format!(
        "Could not find a song for: {}",
        query
    )))
}

/// Create an embed for when a track is skipped
pub fn skipped(track: &Track) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏭️ Skipped")
            .description(format!("Skipped {}", track_link(track)))
            .color(SUCCESS),
    )
}

pub fn cleared(removed: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🧹 Queue Cleared")
            .description(format!("Removed {} pending tracks", removed))
            .color(SUCCESS),
    )
}

pub fn shuffled() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔀 Shuffled")
            .description("The queue has been shuffled")
            .color(SUCCESS),
    )
}

/// Create an embed for when the bot leaves a voice channel
pub fn left_voice_channel() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("👋 Left Voice Channel")
            .description("Successfully disconnected and cleared the queue")
            .color(SUCCESS),
    )
}

/// Create an embed for when the bot fails to leave a voice channel
pub fn failed_to_leave_voice_channel(err: MusicError) -> CreateReply {
    CreateReply::default().embed(error_embed(format!(
        "Failed to leave voice channel: {}",
        err
    )))
}

pub fn invalid_playlist_url(url: &str) -> CreateReply {
    CreateReply::default().embed(error_embed(format!(
        "That doesn't look like a YouTube or Spotify playlist: {}",
        url
    )))
}

pub fn playlist_unavailable(source: PlaylistSource) -> CreateReply {
    CreateReply::default().embed(error_embed(format!(
        "{} playlists are not configured on this bot",
        source
    )))
}

pub fn searching_playlist(source: PlaylistSource, max_items: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔎 Loading Playlist")
            .description(format!(
                "Adding up to {} tracks from the {} playlist...",
                max_items, source
            ))
            .color(SUCCESS),
    )
}

/// Summary posted once a playlist has been ingested.
pub fn playlist_summary(report: &IngestReport) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("📋 Playlist Added")
        .description(format!("Added {} tracks to the queue", report.added))
        .color(if report.added > 0 { SUCCESS } else { FAILURE });

    if !report.not_found.is_empty() {
        let missing = report
            .not_found
            .iter()
            .map(|label| format!("• {}", label))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Could not find", truncate(&missing, 1024), false);
    }

    if let Some(err) = &report.listing_error {
        embed = embed.field("Stopped early", err.to_string(), false);
    } else if report.stopped_full {
        embed = embed.field("Stopped early", "The queue is full", false);
    }

    embed
}

/// Generic error reply for failures with no dedicated message.
pub fn error_reply(err: &MusicError) -> CreateReply {
    CreateReply::default().embed(error_embed(err.to_string()))
}

/// Announcement for an engine event, if it warrants one.
pub fn playback_event(event: &PlaybackEvent) -> Option<CreateEmbed> {
    match event {
        PlaybackEvent::NowPlaying(track) => Some(now_playing(track)),
        PlaybackEvent::StartFailed { track, reason } => Some(error_embed(format!(
            "Could not play {}, skipping: {}",
            track_link(track),
            reason
        ))),
        PlaybackEvent::PlaybackFailed { track, reason } => Some(error_embed(format!(
            "Playback of {} broke off, skipping: {}",
            track_link(track),
            reason
        ))),
        PlaybackEvent::QueueDrained => Some(
            CreateEmbed::new()
                .title("🏁 Queue Finished")
                .description("No more songs in the queue")
                .color(SUCCESS),
        ),
        PlaybackEvent::TrackEnded { .. } => None,
    }
}

/// Posts a session's engine events to `channel` until the session ends.
pub fn spawn_announcer(
    http: Arc<Http>,
    channel: ChannelId,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(embed) = playback_event(&event) else {
                continue;
            };
            if let Err(e) = channel
                .send_message(http.as_ref(), CreateMessage::new().embed(embed))
                .await
            {
                warn!("Failed to announce {:?} in {}: {}", event, channel, e);
            }
        }
        debug!("Announcer for {} stopped", channel);
    });
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
