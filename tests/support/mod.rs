// tests/support/mod.rs
//
// Scripted metrics provider shared by the integration tests: a fixed
// channel whose uploads are described as (age_days, views) pairs, plus
// call counters so tests can assert the resolver's network contracts.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use creator_funding_analyzer::error::{AnalyzeError, Result};
use creator_funding_analyzer::provider::{
    ChannelId, ChannelStats, MetricsProvider, UploadsPage, VideoStats, MAX_BATCH,
};

pub const FIXTURE_CHANNEL_ID: &str = "UCabcdefghij1234567890_-";

pub struct FixtureProvider {
    pub stats: Option<ChannelStats>,
    /// Uploads as (age_days, views); listed in one or more pages of <=50.
    pub videos: Vec<(i64, u64)>,
    /// When true, any search resolves to the fixture channel.
    pub search_hit: bool,
    /// When set, every call fails with an upstream error.
    pub broken: bool,
    pub search_calls: AtomicUsize,
    pub search_queries: Mutex<Vec<String>>,
}

impl FixtureProvider {
    /// The worked scenario: 2M subs, 50M lifetime views, 80 videos,
    /// exactly 1M views published inside a 30-day window.
    pub fn worked_example() -> Self {
        Self {
            stats: Some(ChannelStats {
                subscriber_count: 2_000_000,
                view_count: 50_000_000,
                video_count: 80,
                uploads_playlist: "UUfixture".to_string(),
            }),
            videos: vec![(5, 600_000), (20, 400_000), (60, 9_999_999)],
            search_hit: true,
            broken: false,
            search_calls: AtomicUsize::new(0),
            search_queries: Mutex::new(Vec::new()),
        }
    }

    /// Provider where nothing matches and no channel exists.
    pub fn empty() -> Self {
        Self {
            stats: None,
            videos: Vec::new(),
            search_hit: false,
            broken: false,
            search_calls: AtomicUsize::new(0),
            search_queries: Mutex::new(Vec::new()),
        }
    }

    /// Provider that fails every call, as a dead upstream would.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::worked_example()
        }
    }

    pub fn search_call_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, context: &'static str) -> Result<T> {
        Err(AnalyzeError::upstream(context, "connection refused"))
    }
}

#[async_trait::async_trait]
impl MetricsProvider for FixtureProvider {
    async fn search_channel(&self, query: &str) -> Result<Option<ChannelId>> {
        if self.broken {
            return self.fail("searching channels");
        }
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_queries.lock().unwrap().push(query.to_string());
        Ok(self
            .search_hit
            .then(|| ChannelId(FIXTURE_CHANNEL_ID.to_string())))
    }

    async fn channel_stats(&self, _id: &ChannelId) -> Result<Option<ChannelStats>> {
        if self.broken {
            return self.fail("fetching channel stats");
        }
        Ok(self.stats.clone())
    }

    async fn list_uploads(
        &self,
        _playlist: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage> {
        if self.broken {
            return self.fail("listing uploads");
        }
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + MAX_BATCH).min(self.videos.len());
        let video_ids = (start..end).map(|i| format!("vid{i}")).collect();
        let next = (end < self.videos.len()).then(|| end.to_string());
        Ok(UploadsPage {
            video_ids,
            next_page_token: next,
        })
    }

    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>> {
        if self.broken {
            return self.fail("fetching video stats");
        }
        assert!(ids.len() <= MAX_BATCH, "batch over provider limit");
        Ok(ids
            .iter()
            .map(|id| {
                let idx: usize = id.strip_prefix("vid").unwrap().parse().unwrap();
                let (age_days, views) = self.videos[idx];
                VideoStats {
                    view_count: views,
                    published_at: Utc::now() - Duration::days(age_days),
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
