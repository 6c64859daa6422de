//! YouTube Data API v3 client. Four endpoints cover everything the
//! aggregator needs: search, channels, playlistItems, videos.
//!
//! Counts come back from the API as JSON strings; absent or unparsable
//! counts are read as 0, matching the provider's own documented defaults.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AnalyzeError, Result};
use crate::provider::{ChannelId, ChannelStats, MetricsProvider, UploadsPage, VideoStats, MAX_BATCH};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeProvider {
    /// Requires `YOUTUBE_API_KEY` in the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("YOUTUBE_API_KEY")
            .map_err(|_| anyhow::anyhow!("Missing YOUTUBE_API_KEY env var"))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("creator-funding-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at a different base URL (local stub servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        context: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = ?e, endpoint = path, "youtube transport error");
                AnalyzeError::upstream(context, e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, endpoint = path, "youtube non-success status");
            return Err(AnalyzeError::upstream(context, format!("HTTP {status}")));
        }
        resp.json::<T>()
            .await
            .map_err(|e| AnalyzeError::upstream(context, e))
    }
}

#[async_trait::async_trait]
impl MetricsProvider for YouTubeProvider {
    async fn search_channel(&self, query: &str) -> Result<Option<ChannelId>> {
        let body: SearchResponse = self
            .get_json(
                "searching channels",
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;
        Ok(body
            .items
            .into_iter()
            .next()
            .map(|it| ChannelId(it.snippet.channel_id)))
    }

    async fn channel_stats(&self, id: &ChannelId) -> Result<Option<ChannelStats>> {
        let body: ChannelsResponse = self
            .get_json(
                "fetching channel stats",
                "channels",
                &[
                    ("part", "statistics,contentDetails"),
                    ("id", id.as_str()),
                ],
            )
            .await?;
        let Some(item) = body.items.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(ChannelStats {
            subscriber_count: parse_count(item.statistics.subscriber_count.as_deref()),
            view_count: parse_count(item.statistics.view_count.as_deref()),
            video_count: parse_count(item.statistics.video_count.as_deref()),
            uploads_playlist: item.content_details.related_playlists.uploads,
        }))
    }

    async fn list_uploads(
        &self,
        playlist: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage> {
        let mut query: Vec<(&str, &str)> = vec![
            ("part", "snippet"),
            ("playlistId", playlist),
            ("maxResults", "50"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let body: PlaylistItemsResponse = self
            .get_json("listing uploads", "playlistItems", &query)
            .await?;
        Ok(UploadsPage {
            video_ids: body
                .items
                .into_iter()
                .map(|it| it.snippet.resource_id.video_id)
                .collect(),
            next_page_token: body.next_page_token,
        })
    }

    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>> {
        debug_assert!(ids.len() <= MAX_BATCH);
        let joined = ids.join(",");
        let body: VideosResponse = self
            .get_json(
                "fetching video stats",
                "videos",
                &[("part", "statistics,snippet"), ("id", joined.as_str())],
            )
            .await?;
        Ok(body
            .items
            .into_iter()
            .map(|it| VideoStats {
                view_count: parse_count(it.statistics.view_count.as_deref()),
                published_at: it.snippet.published_at,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

// ---- Wire DTOs (only the fields we read) ----

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}
#[derive(Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
}

#[derive(Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    statistics: ChannelStatistics,
    content_details: ContentDetails,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    view_count: Option<String>,
    video_count: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}
#[derive(Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}
#[derive(Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    resource_id: ResourceId,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}
#[derive(Deserialize)]
struct VideoItem {
    statistics: VideoStatistics,
    snippet: VideoSnippet,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    published_at: DateTime<Utc>,
}
