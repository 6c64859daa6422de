// src/provider/mod.rs
//! Metrics-provider seam: the one external read the pipeline performs.
//! `youtube.rs` holds the real client; tests script the trait directly.

pub mod youtube;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Provider page/batch ceiling (YouTube Data API allows at most 50).
pub const MAX_BATCH: usize = 50;

/// Canonical channel identifier ("UC" + 22 id chars).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifetime aggregate counters plus the uploads list reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
    pub uploads_playlist: String,
}

/// Per-item counters needed for the windowed sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStats {
    pub view_count: u64,
    pub published_at: DateTime<Utc>,
}

/// One page of the uploads listing; `next_page_token` drives pagination.
#[derive(Debug, Clone, Default)]
pub struct UploadsPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

#[async_trait::async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Free-text channel search; first result wins, `None` when nothing matches.
    async fn search_channel(&self, query: &str) -> Result<Option<ChannelId>>;

    /// Aggregate counters for one channel; `None` when the id does not exist.
    async fn channel_stats(&self, id: &ChannelId) -> Result<Option<ChannelStats>>;

    /// One page (<= `MAX_BATCH` items) of the channel's uploads listing.
    async fn list_uploads(
        &self,
        playlist: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage>;

    /// View count + publish timestamp for a batch of <= `MAX_BATCH` ids.
    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>>;

    /// Provider name for diagnostics/logging.
    fn name(&self) -> &'static str;
}
