use anyhow::anyhow;
use serenity::builder::CreateMessage;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Context;
use songbird::{CoreEvent, Event};
use tracing::warn;

use crate::bot::commands::{self, CommandError, Invocation};
use crate::bot::events::DriverDisconnectNotifier;
use crate::bot::CommunityBot;
use crate::ui::embeds;

/// Routes a parsed invocation to its handler. Errors bubble back to the
/// message event, which maps them to the user-visible Thai texts.
pub async fn dispatch(
    ctx: &Context,
    msg: &Message,
    bot: &CommunityBot,
    invocation: &Invocation<'_>,
) -> Result<(), CommandError> {
    match invocation.name {
        "join" => join(ctx, msg, bot).await,
        "play" => play(ctx, msg, bot, invocation).await,
        "stop" => stop(ctx, msg, bot).await,
        "leave" => leave(ctx, msg, bot).await,
        "volume" => volume(ctx, msg, bot, invocation).await,
        "queue" => queue(ctx, msg, bot).await,
        "now" => now(ctx, msg, bot).await,
        "status" => status(ctx, msg, bot).await,
        "help" => help(ctx, msg, bot, invocation).await,
        _ => Err(CommandError::NotFound),
    }
}

/// Joins (or moves to) the author's voice channel and creates the guild's
/// playback state.
async fn join(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    let Some(connect_to) = author_voice_channel(ctx, guild_id, msg.author.id) else {
        say(ctx, msg.channel_id, "คุณต้องอยู่ในห้องเสียงก่อน").await;
        return Ok(());
    };

    let manager = voice_manager(ctx).await;
    let call = manager
        .join(guild_id, connect_to)
        .await
        .map_err(|e| anyhow!("voice join failed: {e}"))?;

    bot.player.ensure_state(guild_id);

    let mut handler = call.lock().await;
    handler.add_global_event(
        Event::Core(CoreEvent::DriverDisconnect),
        DriverDisconnectNotifier {
            guild_id,
            player: bot.player.clone(),
        },
    );

    Ok(())
}

/// Enqueues a track reference, auto-joining the author's channel first, and
/// starts the playback loop when idle.
async fn play(
    ctx: &Context,
    msg: &Message,
    bot: &CommunityBot,
    invocation: &Invocation<'_>,
) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;
    let Some(query) = invocation.args else {
        return Err(CommandError::MissingArgument { command: "play" });
    };

    let manager = voice_manager(ctx).await;
    if manager.get(guild_id).is_none() {
        join(ctx, msg, bot).await?;
    }

    // Still not connected: the author is not in a voice channel and join
    // already told them so.
    let Some(call) = manager.get(guild_id) else {
        return Ok(());
    };

    bot.player.enqueue(guild_id, query, msg.author.id);
    say(ctx, msg.channel_id, "🎵 เพิ่มเพลงในคิวแล้ว").await;

    if !bot.player.is_playing(guild_id) {
        bot.player
            .clone()
            .start_playback(guild_id, call, ctx.http.clone(), msg.channel_id);
    }

    Ok(())
}

/// Stops playback and clears the guild's queue.
async fn stop(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    bot.player.stop(guild_id);

    let manager = voice_manager(ctx).await;
    if manager.get(guild_id).is_some() {
        say(ctx, msg.channel_id, "⏹ หยุดเล่นเพลงแล้ว").await;
    }

    Ok(())
}

/// Disconnects from the voice channel.
async fn leave(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    let manager = voice_manager(ctx).await;
    if manager.get(guild_id).is_some() {
        manager
            .remove(guild_id)
            .await
            .map_err(|e| anyhow!("voice leave failed: {e}"))?;
        bot.player.handle_disconnect(guild_id);
        say(ctx, msg.channel_id, "👋 ออกจากห้องเสียงแล้ว").await;
    }

    Ok(())
}

/// Sets the guild gain; `volume 50` means a gain of 0.5. Values are clamped
/// to 0-100 and applied to the current track immediately.
async fn volume(
    ctx: &Context,
    msg: &Message,
    bot: &CommunityBot,
    invocation: &Invocation<'_>,
) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;
    let Some(arg) = invocation.args else {
        return Err(CommandError::MissingArgument { command: "volume" });
    };

    let manager = voice_manager(ctx).await;
    if manager.get(guild_id).is_none() {
        say(ctx, msg.channel_id, "บอทไม่ได้อยู่ในห้องเสียง").await;
        return Ok(());
    }

    let value: i64 = arg
        .trim()
        .parse()
        .map_err(|_| CommandError::BadArgument { command: "volume" })?;
    let value = value.clamp(0, 100);

    bot.player.set_volume(guild_id, value as f32 / 100.0);
    say(ctx, msg.channel_id, &format!("🔊 ปรับระดับเสียงเป็น {value}%")).await;

    Ok(())
}

/// Lists the pending queue entries.
async fn queue(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    let pending = bot
        .player
        .snapshot(guild_id)
        .map(|s| s.pending)
        .unwrap_or_default();

    if pending.is_empty() {
        say(ctx, msg.channel_id, "คิวว่างเปล่า").await;
    } else {
        say(
            ctx,
            msg.channel_id,
            &format!("🎶 คิวเพลง:\n{}", pending.join("\n")),
        )
        .await;
    }

    Ok(())
}

/// Shows the currently streaming track.
async fn now(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    match bot.player.snapshot(guild_id).and_then(|s| s.current) {
        Some(title) => say(ctx, msg.channel_id, &format!("🎵 กำลังเล่น: {title}")).await,
        None => say(ctx, msg.channel_id, "ไม่มีเพลงที่กำลังเล่นอยู่").await,
    }

    Ok(())
}

/// Connection, playback, volume and queue-length summary.
async fn status(ctx: &Context, msg: &Message, bot: &CommunityBot) -> Result<(), CommandError> {
    let guild_id = require_guild(msg)?;

    let manager = voice_manager(ctx).await;
    let Some(call) = manager.get(guild_id) else {
        say(ctx, msg.channel_id, "❌ ไม่ได้เชื่อมต่อกับห้องเสียง").await;
        return Ok(());
    };

    let connected = call.lock().await.current_connection().is_some();
    let snapshot = bot.player.snapshot(guild_id);
    let playing = snapshot.as_ref().map(|s| s.is_playing).unwrap_or(false);
    let volume = snapshot
        .as_ref()
        .map(|s| s.volume)
        .unwrap_or(bot.config.default_volume);

    let mut lines = vec![
        format!(
            "🎵 สถานะการเชื่อมต่อ: {}",
            if connected { "เชื่อมต่อแล้ว" } else { "ไม่ได้เชื่อมต่อ" }
        ),
        format!(
            "▶️ สถานะการเล่น: {}",
            if playing { "กำลังเล่น" } else { "ไม่ได้เล่น" }
        ),
        format!("🔊 ระดับเสียง: {}%", (volume * 100.0).round() as i64),
    ];
    if let Some(snapshot) = &snapshot {
        lines.push(format!("📋 จำนวนเพลงในคิว: {}", snapshot.pending.len()));
    }

    say(ctx, msg.channel_id, &lines.join("\n")).await;

    Ok(())
}

/// Command overview, or detailed help for one command.
async fn help(
    ctx: &Context,
    msg: &Message,
    bot: &CommunityBot,
    invocation: &Invocation<'_>,
) -> Result<(), CommandError> {
    let prefix = &bot.config.command_prefix;

    let embed = match invocation.args {
        Some(name) => match commands::find(name.trim()) {
            Some(spec) => embeds::command_help(spec),
            None => {
                say(ctx, msg.channel_id, &format!("❌ ไม่พบคำสั่ง `{}`", name.trim())).await;
                return Ok(());
            }
        },
        None => embeds::help_overview(prefix),
    };

    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await
        .map_err(|e| anyhow!("failed to send help embed: {e}"))?;

    Ok(())
}

fn require_guild(msg: &Message) -> Result<GuildId, CommandError> {
    msg.guild_id
        .ok_or_else(|| anyhow!("command used outside a guild").into())
}

/// Voice channel the author currently sits in, if any. The cache borrow must
/// not be held across an await point.
fn author_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}

async fn voice_manager(ctx: &Context) -> std::sync::Arc<songbird::Songbird> {
    songbird::get(ctx)
        .await
        .expect("Songbird voice client registered at startup")
        .clone()
}

async fn say(ctx: &Context, channel_id: ChannelId, content: &str) {
    if let Err(why) = channel_id.say(&ctx.http, content).await {
        warn!("Error sending message: {why:?}");
    }
}
