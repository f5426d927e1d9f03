use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::input::HttpRequest;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::queue::{GuildQueue, QueueSnapshot, QueuedTrack};
use crate::sources::TrackResolver;

/// Track lifecycle signals crossing from the voice driver's threads into a
/// guild's playback loop. Driver callbacks only send on the channel; all
/// state mutation happens on the loop task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    TrackEnded,
    Disconnected,
}

/// Owns all per-guild playback state. Command handlers go through the
/// accessors here; the guild maps are never reached from outside.
pub struct AudioPlayer {
    resolver: Arc<dyn TrackResolver>,
    queues: DashMap<GuildId, Arc<RwLock<GuildQueue>>>,
    current_tracks: DashMap<GuildId, TrackHandle>,
    loop_signals: DashMap<GuildId, flume::Sender<PlaybackEvent>>,
    stream_client: reqwest::Client,
    default_volume: f32,
}

impl AudioPlayer {
    pub fn new(resolver: Arc<dyn TrackResolver>, default_volume: f32) -> Self {
        Self {
            resolver,
            queues: DashMap::new(),
            current_tracks: DashMap::new(),
            loop_signals: DashMap::new(),
            stream_client: reqwest::Client::new(),
            default_volume,
        }
    }

    fn queue(&self, guild_id: GuildId) -> Arc<RwLock<GuildQueue>> {
        self.queues
            .entry(guild_id)
            .or_insert_with(|| Arc::new(RwLock::new(GuildQueue::new(self.default_volume))))
            .clone()
    }

    /// Creates the guild's state if absent. Called from the join command.
    pub fn ensure_state(&self, guild_id: GuildId) {
        self.queue(guild_id);
    }

    /// Appends a track reference to the guild's queue, returning the new
    /// queue length.
    pub fn enqueue(&self, guild_id: GuildId, track_ref: &str, requested_by: UserId) -> usize {
        let len = self
            .queue(guild_id)
            .write()
            .enqueue(QueuedTrack::new(track_ref, requested_by));
        debug!("guild {guild_id}: queued \"{track_ref}\" ({len} pending)");
        len
    }

    pub fn is_playing(&self, guild_id: GuildId) -> bool {
        self.queues
            .get(&guild_id)
            .map(|q| q.read().is_playing())
            .unwrap_or(false)
    }

    pub fn snapshot(&self, guild_id: GuildId) -> Option<QueueSnapshot> {
        self.queues.get(&guild_id).map(|q| q.read().snapshot())
    }

    /// Sets the guild's gain and applies it to the live track, if any.
    pub fn set_volume(&self, guild_id: GuildId, gain: f32) {
        self.queue(guild_id).write().set_volume(gain);
        if let Some(track) = self.current_tracks.get(&guild_id) {
            let _ = track.set_volume(gain);
        }
    }

    /// Clears the queue and stops the live track. The playback loop observes
    /// the drained queue at its next wakeup and exits on its own.
    pub fn stop(&self, guild_id: GuildId) {
        if let Some(queue) = self.queues.get(&guild_id) {
            queue.write().clear();
        }
        if let Some(track) = self.current_tracks.get(&guild_id) {
            let _ = track.stop();
        }
        info!("guild {guild_id}: playback stopped, queue cleared");
    }

    /// Voice connection lost (or left). Clears the guild's state and signals
    /// the loop to halt instead of re-entering resolution.
    pub fn handle_disconnect(&self, guild_id: GuildId) {
        if let Some(queue) = self.queues.get(&guild_id) {
            queue.write().clear();
        }
        if let Some(signal) = self.loop_signals.get(&guild_id) {
            let _ = signal.send(PlaybackEvent::Disconnected);
        }
        if let Some(track) = self.current_tracks.get(&guild_id) {
            let _ = track.stop();
        }
        info!("guild {guild_id}: voice disconnected, queue cleared");
    }

    /// Spawns the guild's playback loop unless one is already streaming.
    ///
    /// The `is_playing` check is the only re-entrancy guard: two play
    /// commands racing before the first track starts can still spawn two
    /// loops. Known limitation, kept as-is.
    pub fn start_playback(
        self: Arc<Self>,
        guild_id: GuildId,
        call: Arc<Mutex<Call>>,
        http: Arc<Http>,
        channel_id: ChannelId,
    ) {
        if self.is_playing(guild_id) {
            return;
        }

        tokio::spawn(async move {
            self.playback_loop(guild_id, call, http, channel_id).await;
        });
    }

    /// Drains the guild's queue: resolve the head, stream it, wait for the
    /// end-of-track signal, repeat. Exits when the queue is empty or the
    /// voice connection drops.
    async fn playback_loop(
        self: Arc<Self>,
        guild_id: GuildId,
        call: Arc<Mutex<Call>>,
        http: Arc<Http>,
        channel_id: ChannelId,
    ) {
        let (tx, rx) = flume::unbounded();
        self.loop_signals.insert(guild_id, tx.clone());

        loop {
            let next = self.queue(guild_id).write().dequeue_head();
            let Some(queued) = next else {
                break;
            };

            let track = match self.resolver.resolve(&queued.track_ref).await {
                Ok(track) => track,
                Err(e) => {
                    // A bad entry is skipped, not retried; the loop moves on.
                    warn!("guild {guild_id}: resolution failed for \"{}\": {e}", queued.track_ref);
                    announce(&http, channel_id, &format!("❌ เกิดปัญหาขณะเล่นเพลง: {e}")).await;
                    continue;
                }
            };

            let volume = self.queue(guild_id).read().volume();
            let source = HttpRequest::new(self.stream_client.clone(), track.stream_url.clone());

            let handle = {
                let mut call = call.lock().await;
                call.play_input(source.into())
            };
            let _ = handle.set_volume(volume);

            if handle
                .add_event(Event::Track(TrackEvent::End), TrackEndNotifier { tx: tx.clone() })
                .is_err()
            {
                // Driver already torn down under us.
                break;
            }

            self.queue(guild_id).write().begin_track(track.title.clone());
            self.current_tracks.insert(guild_id, handle);

            info!("guild {guild_id}: now playing \"{}\"", track.title);
            announce(&http, channel_id, &format!("🎵 กำลังเล่นเพลง: {}", track.title)).await;

            match rx.recv_async().await {
                Ok(PlaybackEvent::TrackEnded) => continue,
                Ok(PlaybackEvent::Disconnected) | Err(_) => break,
            }
        }

        self.queue(guild_id).write().finish_track();
        self.current_tracks.remove(&guild_id);
        self.loop_signals.remove(&guild_id);
        debug!("guild {guild_id}: playback loop exited");
    }
}

/// Forwards end-of-track events from the driver thread to the loop task.
struct TrackEndNotifier {
    tx: flume::Sender<PlaybackEvent>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        let _ = self.tx.send(PlaybackEvent::TrackEnded);
        None
    }
}

async fn announce(http: &Arc<Http>, channel_id: ChannelId, content: &str) {
    if let Err(why) = channel_id.say(http, content).await {
        warn!("Error sending message: {why:?}");
    }
}
