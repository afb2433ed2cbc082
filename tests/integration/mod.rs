//! Integration tests against the public library API.

mod playlist_ingestion;
mod queue_engine;
