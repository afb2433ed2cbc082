//! Bulk ingestion of catalog playlists into a session.

use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::session::SessionHandle;
use crate::commands::music::audio_sources::{CatalogEntry, Resolver};

/// What happened while ingesting a playlist.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    /// Labels of the entries the resolver could not turn into tracks.
    pub not_found: Vec<String>,
    /// Set when listing the playlist failed part way.
    pub listing_error: Option<MusicError>,
    /// Set when ingestion stopped because the queue was full.
    pub stopped_full: bool,
}

/// Resolves every listed entry in catalog order and adds it to the session,
/// starting playback as soon as the first track is in.
///
/// A failure to resolve one entry is recorded and the rest still go in. Only a
/// closed session aborts with an error.
pub async fn ingest_playlist(
    mut entries: BoxStream<'_, MusicResult<CatalogEntry>>,
    resolver: &dyn Resolver,
    session: &SessionHandle,
) -> MusicResult<IngestReport> {
    let mut report = IngestReport::default();

    while let Some(entry) = entries.next().await {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Playlist listing failed after {} tracks: {}", report.added, e);
                report.listing_error = Some(e);
                break;
            }
        };

        let track = match resolver.resolve_catalog_entry(&entry).await {
            Ok(track) => track,
            Err(e) => {
                warn!("Could not resolve '{}': {}", entry.label(), e);
                report.not_found.push(entry.label());
                continue;
            }
        };

        match session.enqueue_and_advance(track).await {
            Ok(_) => report.added += 1,
            Err(MusicError::QueueFull(_)) => {
                report.stopped_full = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Playlist ingestion done: {} added, {} not found",
        report.added,
        report.not_found.len()
    );
    Ok(report)
}
