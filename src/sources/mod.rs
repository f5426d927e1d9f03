pub mod ytdlp;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use ytdlp::YtDlpResolver;

/// Resolves a track reference (URL or search string) into streamable
/// metadata.
///
/// Resolution runs off the gateway event loop: implementations spawn worker
/// processes or tasks and the caller awaits the result. A failed resolution
/// is reported once and the caller moves on; there is no internal retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, track_ref: &str) -> Result<ResolvedTrack, ResolutionError>;
}

/// Streamable metadata for a single track. Ephemeral: dropped after playback
/// or on failure, never persisted.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub title: String,
    /// Direct audio stream address, fed to the voice driver.
    pub stream_url: String,
    pub webpage_url: Option<String>,
    pub duration: Option<Duration>,
    pub uploader: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to run yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("yt-dlp failed: {0}")]
    Extractor(String),

    #[error("unreadable track metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("no stream url in track metadata")]
    MissingStream,
}
