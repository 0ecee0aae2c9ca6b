//! Implements [`TrackResolver`] by shelling out to `yt-dlp`. Plain text is
//! treated as a YouTube search; URLs are handed to yt-dlp as-is, so anything
//! it can extract (YouTube, SoundCloud, Bandcamp, direct files) works.

use serenity::async_trait;
use serenity::model::id::UserId;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{AudioSource, ResolveError, TrackResolver, track_metadata::TrackMetadata};

/// Resolves tracks through the `yt-dlp` binary on `PATH`.
pub struct YoutubeResolver {
    timeout: Duration,
}

impl YoutubeResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The argument handed to yt-dlp for a user query.
    fn search_param(query: &str) -> String {
        let query = query.trim();
        if AudioSource::is_url(query) {
            query.to_string()
        } else {
            format!("ytsearch1:{}", query)
        }
    }

    /// Classifies a finished yt-dlp run.
    fn parse_output(
        query: &str,
        output: &Output,
        requested_by: UserId,
    ) -> Result<TrackMetadata, ResolveError> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        // ytsearch with no hits exits cleanly with nothing on stdout
        let first_line = stdout.lines().find(|line| !line.trim().is_empty());

        match (output.status.success(), first_line) {
            (_, Some(line)) => TrackMetadata::from_ytdlp_json(line, requested_by),
            (true, None) => Err(ResolveError::NotFound(query.to_string())),
            (false, None) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let reason = stderr
                    .lines()
                    .rev()
                    .find(|line| line.starts_with("ERROR"))
                    .unwrap_or("yt-dlp exited with an error")
                    .to_string();

                if reason.contains("Unsupported URL") || reason.contains("Video unavailable") {
                    Err(ResolveError::NotFound(query.to_string()))
                } else {
                    Err(ResolveError::Failed(reason))
                }
            }
        }
    }
}

#[async_trait]
impl TrackResolver for YoutubeResolver {
    async fn resolve(&self, query: &str, requested_by: UserId) -> Result<TrackMetadata, ResolveError> {
        let search_param = Self::search_param(query);
        info!("Resolving track for query: {}", search_param);

        let mut command = Command::new("yt-dlp");
        command
            .args([
                "-j",            // Output as JSON
                "--no-playlist", // Don't process playlists
                "--no-warnings",
                search_param.as_str(),
            ])
            .kill_on_drop(true);
        let run = command.output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Failed to run yt-dlp: {}", e);
                return Err(ResolveError::Failed(format!("Failed to run yt-dlp: {}", e)));
            }
            Err(_) => {
                warn!("yt-dlp timed out after {:?} for {}", self.timeout, search_param);
                return Err(ResolveError::TimedOut(self.timeout));
            }
        };

        let result = Self::parse_output(query, &output, requested_by);
        debug!("Resolution result for {}: {:?}", search_param, result);
        result
    }
}
