//! Test fixtures for the woki-dj bot
//! This module contains sample tracks and catalog entries used in tests

use fake::Fake;
use fake::faker::lorem::en::Words;
use woki_dj::commands::music::audio_sources::{CatalogEntry, Track};

/// A resolved track whose media reference is derived from its title.
pub fn track(title: &str) -> Track {
    Track::new(
        format!("https://www.youtube.com/watch?v={}", title.replace(' ', "_")),
        title,
    )
}

/// `count` tracks with distinct generated titles.
pub fn random_tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|n| {
            let words: Vec<String> = Words(2..4).fake();
            track(&format!("{} {}", words.join(" "), n))
        })
        .collect()
}

/// A Spotify-style catalog entry that has to be resolved by search.
pub fn catalog_entry(id: &str, title: &str, artist: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        title: title.to_string(),
        artists: vec![artist.to_string()],
        direct_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_titles_are_distinct() {
        let tracks = random_tracks(20);
        let mut titles: Vec<&str> = tracks.iter().map(|t| t.title()).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 20);
    }
}
