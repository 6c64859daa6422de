//! aggregate.rs — one `ChannelMetrics` snapshot per call: lifetime counters
//! plus a windowed view sum over recently published uploads.
//!
//! Sequence per call: one stats fetch, the full paginated uploads listing,
//! then per-video stats in batches of at most 50. Summation order never
//! affects the result, so batches could be parallelized later without
//! changing outputs.

use chrono::{Duration, Utc};

use crate::analysis::ChannelMetrics;
use crate::error::{AnalyzeError, Result};
use crate::provider::{ChannelId, MetricsProvider, MAX_BATCH};

pub async fn fetch_metrics(
    provider: &dyn MetricsProvider,
    id: &ChannelId,
    window_days: u32,
) -> Result<ChannelMetrics> {
    if window_days == 0 {
        return Err(AnalyzeError::validation(
            "window must be at least one day",
        ));
    }

    let stats = provider
        .channel_stats(id)
        .await?
        .ok_or_else(|| AnalyzeError::not_found(id.as_str()))?;

    let video_ids = list_all_uploads(provider, &stats.uploads_playlist).await?;

    // Items published before the cutoff are excluded entirely; no
    // partial-day weighting.
    let cutoff = Utc::now() - Duration::days(i64::from(window_days));
    let mut views_in_window: u64 = 0;
    for batch in video_ids.chunks(MAX_BATCH) {
        for video in provider.video_stats(batch).await? {
            if video.published_at >= cutoff {
                views_in_window += video.view_count;
            }
        }
    }

    tracing::debug!(
        provider = provider.name(),
        channel = id.as_str(),
        uploads = video_ids.len(),
        window_days,
        views_in_window,
        "aggregated channel metrics"
    );

    Ok(ChannelMetrics {
        subscriber_count: stats.subscriber_count,
        total_views: stats.view_count,
        views_in_window,
        window_days,
        video_count: stats.video_count,
        estimated_revenue_usd: 0.0,
    })
}

/// Walk the uploads listing to the end, following page tokens.
async fn list_all_uploads(
    provider: &dyn MetricsProvider,
    playlist: &str,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = provider.list_uploads(playlist, token.as_deref()).await?;
        ids.extend(page.video_ids);
        match page.next_page_token {
            Some(t) if !t.is_empty() => token = Some(t),
            _ => break,
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChannelStats, UploadsPage, VideoStats};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: a fixed channel with uploads split across pages,
    /// each video `(age_days, views)`.
    struct Scripted {
        stats: Option<ChannelStats>,
        pages: Vec<Vec<(i64, u64)>>,
        stat_batches: AtomicUsize,
    }

    impl Scripted {
        fn new(stats: Option<ChannelStats>, pages: Vec<Vec<(i64, u64)>>) -> Self {
            Self {
                stats,
                pages,
                stat_batches: AtomicUsize::new(0),
            }
        }

        fn channel(pages: Vec<Vec<(i64, u64)>>) -> Self {
            let videos: u64 = pages.iter().map(|p| p.len() as u64).sum();
            Self::new(
                Some(ChannelStats {
                    subscriber_count: 2_000_000,
                    view_count: 50_000_000,
                    video_count: videos,
                    uploads_playlist: "UUfixture".to_string(),
                }),
                pages,
            )
        }

        fn video(&self, key: &str) -> VideoStats {
            // key format "p<page>-<idx>"
            let rest = key.strip_prefix('p').unwrap();
            let (page, idx) = rest.split_once('-').unwrap();
            let (age_days, views) =
                self.pages[page.parse::<usize>().unwrap()][idx.parse::<usize>().unwrap()];
            VideoStats {
                view_count: views,
                published_at: Utc::now() - Duration::days(age_days),
            }
        }
    }

    #[async_trait::async_trait]
    impl MetricsProvider for Scripted {
        async fn search_channel(&self, _query: &str) -> Result<Option<ChannelId>> {
            Ok(None)
        }
        async fn channel_stats(&self, _id: &ChannelId) -> Result<Option<ChannelStats>> {
            Ok(self.stats.clone())
        }
        async fn list_uploads(
            &self,
            _playlist: &str,
            page_token: Option<&str>,
        ) -> Result<UploadsPage> {
            let page: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let video_ids = self.pages[page]
                .iter()
                .enumerate()
                .map(|(i, _)| format!("p{page}-{i}"))
                .collect();
            let next = (page + 1 < self.pages.len()).then(|| (page + 1).to_string());
            Ok(UploadsPage {
                video_ids,
                next_page_token: next,
            })
        }
        async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>> {
            assert!(ids.len() <= MAX_BATCH, "batch over provider limit");
            self.stat_batches.fetch_add(1, Ordering::SeqCst);
            Ok(ids.iter().map(|k| self.video(k)).collect())
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn cid() -> ChannelId {
        ChannelId("UCabcdefghij1234567890_-".to_string())
    }

    #[tokio::test]
    async fn sums_only_videos_inside_the_window() {
        let provider = Scripted::channel(vec![vec![
            (1, 600_000),
            (10, 400_000),
            (45, 9_000_000), // outside the 30-day window
        ]]);
        let m = fetch_metrics(&provider, &cid(), 30).await.unwrap();
        assert_eq!(m.views_in_window, 1_000_000);
        assert_eq!(m.window_days, 30);
        assert_eq!(m.subscriber_count, 2_000_000);
        assert_eq!(m.total_views, 50_000_000);
        assert_eq!(m.video_count, 3);
    }

    #[tokio::test]
    async fn follows_pagination_across_pages() {
        let provider = Scripted::channel(vec![
            vec![(2, 100); 50],
            vec![(3, 100); 50],
            vec![(4, 100); 7],
        ]);
        let m = fetch_metrics(&provider, &cid(), 30).await.unwrap();
        assert_eq!(m.views_in_window, 107 * 100);
        // 107 ids → three batches of <=50.
        assert_eq!(provider.stat_batches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_channel_makes_no_per_item_calls() {
        let provider = Scripted::channel(vec![vec![]]);
        let m = fetch_metrics(&provider, &cid(), 30).await.unwrap();
        assert_eq!(m.views_in_window, 0);
        assert_eq!(provider.stat_batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_videos_outside_window_is_zero_not_error() {
        let provider = Scripted::channel(vec![vec![(100, 5_000), (200, 7_000)]]);
        let m = fetch_metrics(&provider, &cid(), 30).await.unwrap();
        assert_eq!(m.views_in_window, 0);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let provider = Scripted::new(None, vec![]);
        let err = fetch_metrics(&provider, &cid(), 30).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn zero_window_fails_before_any_network_call() {
        let provider = Scripted::channel(vec![vec![(1, 100)]]);
        let err = fetch_metrics(&provider, &cid(), 0).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::Validation(_)));
    }
}
