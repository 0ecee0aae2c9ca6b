//! Defines the `TrackMetadata` struct, the resolved, immutable description of a
//! playable track, and its conversion from `yt-dlp --dump-json` output.

use serde::Deserialize;
use serenity::model::id::UserId;
use std::time::Duration;

use super::ResolveError;

/// One resolved, playable item.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// Uploader or artist.
    pub author: String,
    /// Page URL the transport streams from.
    pub url: String,
    /// The duration of the track, if known. Live streams have none.
    pub duration: Option<Duration>,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
    /// The user who requested the track.
    pub requested_by: UserId,
}

/// The subset of yt-dlp's info dict we care about.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    artist: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

impl TrackMetadata {
    /// Parses one JSON line produced by `yt-dlp -j`.
    pub fn from_ytdlp_json(json: &str, requested_by: UserId) -> Result<Self, ResolveError> {
        let info: YtDlpInfo = serde_json::from_str(json.trim())
            .map_err(|e| ResolveError::Failed(format!("Failed to parse video metadata: {}", e)))?;

        let title = info
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ResolveError::Failed("Metadata has no title".to_string()))?;

        let url = info
            .webpage_url
            .or(info.original_url)
            .ok_or_else(|| ResolveError::Failed(format!("No playable URL for '{}'", title)))?;

        let author = info
            .artist
            .or(info.uploader)
            .or(info.channel)
            .unwrap_or_else(|| "Unknown artist".to_string());

        let duration = info
            .duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64);

        Ok(Self {
            title,
            author,
            url,
            duration,
            thumbnail: info.thumbnail,
            requested_by,
        })
    }
}
