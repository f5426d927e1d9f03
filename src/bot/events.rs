use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::GuildId;
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler};
use tracing::warn;

use crate::audio::player::AudioPlayer;

/// Watches the voice driver for involuntary disconnects. Registered as a
/// global call event on join; routes into the same state-clearing path as
/// the gateway's voice_state_update.
pub struct DriverDisconnectNotifier {
    pub guild_id: GuildId,
    pub player: Arc<AudioPlayer>,
}

#[async_trait]
impl VoiceEventHandler for DriverDisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(_) = ctx {
            warn!("guild {}: voice driver disconnected", self.guild_id);
            self.player.handle_disconnect(self.guild_id);
        }
        None
    }
}
