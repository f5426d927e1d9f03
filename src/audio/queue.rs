use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serenity::model::id::UserId;

/// A pending, unresolved queue entry. References are resolved only when the
/// playback loop reaches them.
#[derive(Debug, Clone)]
pub struct QueuedTrack {
    pub track_ref: String,
    pub requested_by: UserId,
    pub added_at: DateTime<Utc>,
}

impl QueuedTrack {
    pub fn new(track_ref: impl Into<String>, requested_by: UserId) -> Self {
        Self {
            track_ref: track_ref.into(),
            requested_by,
            added_at: Utc::now(),
        }
    }
}

/// Read-only view of a guild's playback state for the status commands.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub pending: Vec<String>,
    pub current: Option<String>,
    pub is_playing: bool,
    pub volume: f32,
}

/// Per-guild playback state: a FIFO of pending track references plus the
/// currently streaming track.
///
/// Invariant: `current` is set only while `is_playing` is true; both are
/// cleared together when the queue drains, on stop, and on voice disconnect.
#[derive(Debug)]
pub struct GuildQueue {
    items: VecDeque<QueuedTrack>,
    current: Option<String>,
    is_playing: bool,
    volume: f32,
}

impl GuildQueue {
    pub fn new(volume: f32) -> Self {
        Self {
            items: VecDeque::new(),
            current: None,
            is_playing: false,
            volume,
        }
    }

    /// Appends a reference to the tail. Insertion order is play order; no
    /// dedup, no priority, no length bound.
    pub fn enqueue(&mut self, track: QueuedTrack) -> usize {
        self.items.push_back(track);
        self.items.len()
    }

    /// Removes and returns the head, or `None` when the queue is empty.
    pub fn dequeue_head(&mut self) -> Option<QueuedTrack> {
        self.items.pop_front()
    }

    /// Marks a track as streaming. Called by the playback loop once the head
    /// has been handed to the voice driver.
    pub fn begin_track(&mut self, title: impl Into<String>) {
        self.current = Some(title.into());
        self.is_playing = true;
    }

    /// Clears the streaming marker once the loop stops driving audio.
    pub fn finish_track(&mut self) {
        self.current = None;
        self.is_playing = false;
    }

    /// Empties the queue and resets playing state. Used by the stop command
    /// and on voice disconnect.
    pub fn clear(&mut self) {
        self.items.clear();
        self.finish_track();
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pending: self.items.iter().map(|t| t.track_ref.clone()).collect(),
            current: self.current.clone(),
            is_playing: self.is_playing,
            volume: self.volume,
        }
    }
}
