//! Community bot for the server: music playback over voice plus a GitHub
//! webhook relay.
//!
//! Two binaries share this crate:
//!
//! - `nong-bot` - the Discord bot (prefix commands, per-guild music queue)
//! - `nong-webhook` - the GitHub webhook receiver (axum HTTP server)
//!
//! The processes only share [`config`]; everything else is per-binary.

pub mod audio;
pub mod bot;
pub mod config;
pub mod sources;
pub mod ui;
pub mod webhook;
