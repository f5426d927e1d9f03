//! Discord-facing half of the bot: gateway event handling, prefix command
//! dispatch, and the voice lifecycle.
//!
//! [`CommunityBot`] implements serenity's [`EventHandler`]. Incoming messages
//! are parsed against the configured prefix and routed through
//! [`handlers::dispatch`]; command failures are mapped to the user-visible
//! Thai error texts here, so nothing propagates out of an event.

pub mod commands;
pub mod events;
pub mod handlers;

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::voice::VoiceState;
use serenity::prelude::{Context, EventHandler};
use tracing::{error, info, warn};

use crate::audio::player::AudioPlayer;
use crate::bot::commands::CommandError;
use crate::config::BotConfig;
use crate::sources::YtDlpResolver;

pub struct CommunityBot {
    pub config: Arc<BotConfig>,
    pub player: Arc<AudioPlayer>,
}

impl CommunityBot {
    pub fn new(config: BotConfig) -> Self {
        let default_volume = config.default_volume;
        Self {
            config: Arc::new(config),
            player: Arc::new(AudioPlayer::new(
                Arc::new(YtDlpResolver::new()),
                default_volume,
            )),
        }
    }
}

#[async_trait]
impl EventHandler for CommunityBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let prefix = self.config.command_prefix.clone();
        let Some(invocation) = commands::parse(&msg.content, &prefix) else {
            return;
        };

        if let Err(e) = handlers::dispatch(&ctx, &msg, self, &invocation).await {
            if let CommandError::Internal(ref inner) = e {
                error!("command {} failed: {inner:?}", invocation.name);
            }
            if let Err(why) = msg.channel_id.say(&ctx.http, e.user_message(&prefix)).await {
                warn!("Error sending message: {why:?}");
            }
        }
    }

    /// Clears a guild's playback state when the bot loses its voice channel,
    /// voluntarily or not.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let bot_id = ctx.cache.current_user().id;
        if new.user_id != bot_id {
            return;
        }

        let had_channel = old.as_ref().and_then(|state| state.channel_id).is_some();
        if had_channel && new.channel_id.is_none() {
            let guild_id = new.guild_id.or_else(|| old.as_ref().and_then(|s| s.guild_id));
            if let Some(guild_id) = guild_id {
                warn!("guild {guild_id}: bot removed from voice channel");
                self.player.handle_disconnect(guild_id);
            }
        }
    }
}
