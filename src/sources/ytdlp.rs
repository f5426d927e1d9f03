use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{ResolutionError, ResolvedTrack, TrackResolver};

/// Track resolver backed by the yt-dlp CLI.
///
/// One subprocess per resolution: `--dump-json` prints the extracted metadata
/// (including the direct `bestaudio` stream address) without downloading
/// anything. Plain search terms are routed through `ytsearch`.
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    /// Verifies that yt-dlp is installed and runnable.
    pub async fn verify_dependencies() -> anyhow::Result<()> {
        let output = async_process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!("yt-dlp version: {}", version.trim());
                Ok(())
            }
            _ => anyhow::bail!("yt-dlp not found, install with: pip install yt-dlp"),
        }
    }

    /// Anything that parses as an http(s) URL is passed through untouched;
    /// everything else becomes a YouTube search for the first hit.
    fn normalize_ref(track_ref: &str) -> String {
        match Url::parse(track_ref) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => track_ref.to_string(),
            _ => format!("ytsearch1:{track_ref}"),
        }
    }

    fn parse_metadata(json_line: &str) -> Result<ResolvedTrack, ResolutionError> {
        let meta: YtDlpMetadata = serde_json::from_str(json_line)?;

        let stream_url = meta.url.ok_or(ResolutionError::MissingStream)?;

        Ok(ResolvedTrack {
            title: meta.title.unwrap_or_else(|| "Unknown".to_string()),
            stream_url,
            webpage_url: meta.webpage_url,
            duration: meta.duration.map(Duration::from_secs_f64),
            uploader: meta.uploader,
        })
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, track_ref: &str) -> Result<ResolvedTrack, ResolutionError> {
        let target = Self::normalize_ref(track_ref);
        debug!("resolving track: {target}");

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--default-search",
                "ytsearch",
                "--socket-timeout",
                "30",
                "--retries",
                "3",
                "--no-warnings",
                "--quiet",
            ])
            .arg(&target)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolutionError::Extractor(
                stderr.trim().lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or(ResolutionError::MissingStream)?;

        let track = Self::parse_metadata(line)?;
        info!("resolved \"{}\" -> {}", track_ref, track.title);

        Ok(track)
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpMetadata {
    title: Option<String>,
    /// Direct stream address for the selected format.
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn urls_pass_through_and_search_terms_get_prefixed() {
        assert_eq!(
            YtDlpResolver::normalize_ref("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            YtDlpResolver::normalize_ref("never gonna give you up"),
            "ytsearch1:never gonna give you up"
        );
        // A bare scheme-less host is still treated as a search term.
        assert_eq!(
            YtDlpResolver::normalize_ref("youtube.com/watch?v=abc"),
            "ytsearch1:youtube.com/watch?v=abc"
        );
    }

    #[test]
    fn parses_full_metadata() {
        let line = r#"{
            "title": "Test Song",
            "url": "https://cdn.example.com/audio.webm",
            "webpage_url": "https://www.youtube.com/watch?v=abc",
            "duration": 213.0,
            "uploader": "Test Channel"
        }"#;

        let track = YtDlpResolver::parse_metadata(line).unwrap();
        assert_eq!(track.title, "Test Song");
        assert_eq!(track.stream_url, "https://cdn.example.com/audio.webm");
        assert_eq!(track.duration, Some(Duration::from_secs(213)));
        assert_eq!(track.uploader.as_deref(), Some("Test Channel"));
    }

    #[test]
    fn missing_stream_url_is_an_error() {
        let line = r#"{"title": "No Stream"}"#;
        assert!(matches!(
            YtDlpResolver::parse_metadata(line),
            Err(ResolutionError::MissingStream)
        ));
    }

    #[test]
    fn malformed_metadata_is_an_error() {
        assert!(matches!(
            YtDlpResolver::parse_metadata("not json"),
            Err(ResolutionError::Metadata(_))
        ));
    }

    #[test]
    fn missing_title_falls_back_to_unknown() {
        let line = r#"{"url": "https://cdn.example.com/a.webm"}"#;
        let track = YtDlpResolver::parse_metadata(line).unwrap();
        assert_eq!(track.title, "Unknown");
    }
}
