//! Lazy, cursor-driven pagination for catalog playlist listings.

use futures::stream::{self, BoxStream, StreamExt};
use futures::{Future, future};
use tracing::debug;

use super::CatalogEntry;
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// One page of a catalog listing and the opaque cursor of the next page.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub next_cursor: Option<String>,
}

enum PageCursor {
    First,
    Next(String),
    Exhausted,
}

/// Turns a page fetcher into a stream of entries.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// cursor afterwards. Pages with no entries are skipped over. The stream ends
/// after `max_items` entries, when a page has no cursor or repeats the cursor
/// it was fetched with, or right after yielding a fetch error.
pub fn paginate<'a, F, Fut>(
    max_items: usize,
    fetch_page: F,
) -> BoxStream<'a, MusicResult<CatalogEntry>>
where
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = MusicResult<CatalogPage>> + Send + 'a,
{
    if max_items == 0 {
        return stream::empty().boxed();
    }

    stream::unfold(
        (fetch_page, PageCursor::First),
        |(mut fetch_page, cursor)| async move {
            let token = match cursor {
                PageCursor::Exhausted => return None,
                PageCursor::First => None,
                PageCursor::Next(token) => Some(token),
            };

            debug!("Fetching catalog page (cursor: {:?})", token);
            let previous = token.clone();

            match fetch_page(token).await {
                Ok(CatalogPage {
                    entries,
                    next_cursor,
                }) => {
                    let next = match next_cursor {
                        Some(cursor) if previous.as_deref() != Some(cursor.as_str()) => {
                            PageCursor::Next(cursor)
                        }
                        _ => PageCursor::Exhausted,
                    };
                    let page = stream::iter(entries.into_iter().map(Ok::<_, MusicError>));
                    Some((page.left_stream(), (fetch_page, next)))
                }
                Err(err) => {
                    let failed = stream::once(future::ready(Err(err)));
                    Some((failed.right_stream(), (fetch_page, PageCursor::Exhausted)))
                }
            }
        },
    )
    .flatten()
    .take(max_items)
    .boxed()
}
