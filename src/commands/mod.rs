//! This module aggregates all the command modules for the bot.

/// Music playback commands, the queue engine and its collaborators.
pub mod music;
