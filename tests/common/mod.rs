//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories

pub mod fixtures;
pub mod mocks;

use woki_dj::commands::music::utils::queue_manager::QueuePage;
use woki_dj::commands::music::utils::session::SessionHandle;

/// Titles on one queue page, in display order.
pub fn page_titles(page: &QueuePage) -> Vec<String> {
    page.entries.iter().map(|(_, title)| title.clone()).collect()
}

/// Round-trips through the session mailbox. Everything sent before this call
/// has been handled once it returns.
pub async fn settle(session: &SessionHandle) {
    session
        .snapshot(1, 0)
        .await
        .expect("session should still be running");
}
