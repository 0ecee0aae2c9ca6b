//! Track resolution: turning a search query or URL into a [`TrackMetadata`]
//! the playback transport can stream.

/// Submodule defining the `TrackMetadata` struct used across the music module.
pub mod track_metadata;
/// Submodule implementing `TrackResolver` on top of `yt-dlp`.
pub mod youtube;

use serenity::async_trait;
use serenity::model::id::UserId;
use std::time::Duration;
use thiserror::Error;
use track_metadata::TrackMetadata;
use url::Url;

/// Why a query could not be turned into a track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No results found for {0:?}")]
    NotFound(String),

    #[error("Resolution failed: {0}")]
    Failed(String),

    #[error("Resolution timed out after {0:?}")]
    TimedOut(Duration),
}

/// Looks tracks up by query or URL. Implementations hold no per-call state and
/// may be invoked concurrently for different guilds.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolves `query` to a single playable track, attributed to `requested_by`.
    ///
    /// Must return within a bounded time; running out of time is reported as
    /// [`ResolveError::TimedOut`], never as [`ResolveError::NotFound`].
    async fn resolve(&self, query: &str, requested_by: UserId) -> Result<TrackMetadata, ResolveError>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as an http(s) URL.
    /// Does not validate if the URL is actually reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
