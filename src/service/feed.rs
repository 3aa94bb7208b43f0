//! Feed assembly service
//!
//! Composes paginated, per-viewer-annotated video listings on top of the
//! store's limited query surface. The store offers equality-filtered
//! ordered scans and bounded in-set lookups only, so the following and
//! saved feeds fan out over id batches and merge in memory; callers must
//! never be able to tell batching happened.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::config::FeedConfig;
use crate::data::{Category, IN_BATCH_SIZE, Store, Video};
use crate::error::AppError;
use crate::metrics::{FEED_ASSEMBLY_DURATION_SECONDS, FEED_QUERIES_TOTAL};

/// Validated pagination window
///
/// Pages are 1-indexed. Construction enforces the server-side cap;
/// requests above it fail validation rather than being clamped.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Resolve optional client parameters against the configured defaults.
    pub fn resolve(
        page: Option<u32>,
        limit: Option<u32>,
        config: &FeedConfig,
    ) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Validation(
                "Page must be a positive integer".to_string(),
            ));
        }

        let limit = limit.unwrap_or(config.default_limit);
        if limit < 1 || limit > config.max_limit {
            return Err(AppError::Validation(format!(
                "Limit must be between 1 and {}",
                config.max_limit
            )));
        }

        Ok(Self { page, limit })
    }

    /// Zero-based window offset, widened so an absurdly large page number
    /// yields an empty window instead of wrapping.
    fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }
}

/// Pagination metadata returned with every feed page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_videos: u64,
}

impl Pagination {
    fn new(page: &PageRequest, total_videos: u64) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total_pages: total_videos.div_ceil(page.limit as u64) as u32,
            total_videos,
        }
    }
}

/// A video annotated with the requesting viewer's save status
#[derive(Debug, Clone, Serialize)]
pub struct FeedVideo {
    #[serde(flatten)]
    pub video: Video,
    #[serde(rename = "isSaved")]
    pub is_saved: bool,
}

/// One assembled feed page
///
/// Either fully assembled or the whole call fails; no partial pages.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub videos: Vec<FeedVideo>,
    pub pagination: Pagination,
}

impl FeedPage {
    fn empty(page: &PageRequest) -> Self {
        Self {
            videos: vec![],
            pagination: Pagination::new(page, 0),
        }
    }
}

/// Sort newest first; ties on creation time break by id descending so the
/// merged multi-batch order is identical to a single unbatched query.
fn merge_newest_first(videos: &mut [Video]) {
    videos.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.video_id.cmp(&a.video_id))
    });
}

fn window<T>(items: Vec<T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .collect()
}

/// Feed assembler
pub struct FeedService {
    store: Arc<Store>,
}

impl FeedService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Global feed: the entire collection, newest first.
    pub async fn global_feed(
        &self,
        viewer: Option<&str>,
        page: &PageRequest,
    ) -> Result<FeedPage, AppError> {
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&["global"])
            .start_timer();
        FEED_QUERIES_TOTAL.with_label_values(&["global"]).inc();

        let total = self.store.count_videos().await? as u64;
        let videos = self.store.list_videos(page.limit, page.offset()).await?;
        let videos = self.annotate(viewer, videos).await?;

        Ok(FeedPage {
            videos,
            pagination: Pagination::new(page, total),
        })
    }

    /// Category feed: same window as the global feed, filtered to one
    /// category. The category is pre-validated by the caller.
    pub async fn category_feed(
        &self,
        category: Category,
        viewer: Option<&str>,
        page: &PageRequest,
    ) -> Result<FeedPage, AppError> {
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&["category"])
            .start_timer();
        FEED_QUERIES_TOTAL.with_label_values(&["category"]).inc();

        let category = category.as_str();
        let total = self.store.count_videos_in_category(category).await? as u64;
        let videos = self
            .store
            .list_videos_in_category(category, page.limit, page.offset())
            .await?;
        let videos = self.annotate(viewer, videos).await?;

        Ok(FeedPage {
            videos,
            pagination: Pagination::new(page, total),
        })
    }

    /// User-uploaded feed: one uploader's videos, newest first.
    ///
    /// This listing is uploader-scoped rather than viewer-scoped, so
    /// `isSaved` is reported false for every entry.
    pub async fn user_feed(
        &self,
        uploader_id: &str,
        page: &PageRequest,
    ) -> Result<FeedPage, AppError> {
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&["user"])
            .start_timer();
        FEED_QUERIES_TOTAL.with_label_values(&["user"]).inc();

        let total = self.store.count_videos_by_uploader(uploader_id).await? as u64;
        let videos = self
            .store
            .list_videos_by_uploader(uploader_id, page.limit, page.offset())
            .await?;
        let videos = videos
            .into_iter()
            .map(|video| FeedVideo {
                video,
                is_saved: false,
            })
            .collect();

        Ok(FeedPage {
            videos,
            pagination: Pagination::new(page, total),
        })
    }

    /// Following feed: videos from every uploader the viewer follows.
    ///
    /// The store's in-set filter is capped at [`IN_BATCH_SIZE`] ids, so the
    /// followee set is partitioned, one ordered query runs per batch, and
    /// the union is re-sorted in memory. Batching partitions uploader ids,
    /// not videos, so no video can be dropped or duplicated across batches.
    pub async fn following_feed(
        &self,
        viewer: &str,
        page: &PageRequest,
    ) -> Result<FeedPage, AppError> {
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&["following"])
            .start_timer();
        FEED_QUERIES_TOTAL.with_label_values(&["following"]).inc();

        let followee_ids = self.store.following_ids(viewer).await?;
        if followee_ids.is_empty() {
            // No candidates; do not touch the video collection at all.
            return Ok(FeedPage::empty(page));
        }

        let mut merged = Vec::new();
        for batch in followee_ids.chunks(IN_BATCH_SIZE) {
            merged.extend(self.store.videos_by_uploaders(batch).await?);
        }
        merge_newest_first(&mut merged);

        // Total is the full merged set, not the page window.
        let total = merged.len() as u64;
        let videos = window(merged, page);
        let videos = self.annotate(Some(viewer), videos).await?;

        Ok(FeedPage {
            videos,
            pagination: Pagination::new(page, total),
        })
    }

    /// Saved feed: the viewer's bookmarks, most recently saved first.
    ///
    /// Ordering follows bookmark recency, not video creation time. The id
    /// list is sliced to the page window before any video bodies are
    /// fetched, so a large saved-list never causes an unbounded read.
    pub async fn saved_feed(&self, viewer: &str, page: &PageRequest) -> Result<FeedPage, AppError> {
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&["saved"])
            .start_timer();
        FEED_QUERIES_TOTAL.with_label_values(&["saved"]).inc();

        let bookmarks = self.store.bookmarks_by_user(viewer).await?;
        if bookmarks.is_empty() {
            return Ok(FeedPage::empty(page));
        }

        let total = bookmarks.len() as u64;
        let page_ids: Vec<String> = window(bookmarks, page)
            .into_iter()
            .map(|bookmark| bookmark.video_id)
            .collect();

        let mut bodies = Vec::new();
        for batch in page_ids.chunks(IN_BATCH_SIZE) {
            bodies.extend(self.store.videos_by_ids(batch).await?);
        }

        // Restore bookmark order; a bookmark whose video vanished between
        // the two reads is silently dropped from the page.
        let mut by_id: HashMap<String, Video> = bodies
            .into_iter()
            .map(|video| (video.video_id.clone(), video))
            .collect();
        let videos = page_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(|video| FeedVideo {
                video,
                is_saved: true,
            })
            .collect();

        Ok(FeedPage {
            videos,
            pagination: Pagination::new(page, total),
        })
    }

    /// Annotate a page of videos with the viewer's save status.
    ///
    /// Uses the same bounded in-set lookup as the feeds themselves; with
    /// the page capped at 50 this is at most five bookmark queries.
    pub(crate) async fn annotate(
        &self,
        viewer: Option<&str>,
        videos: Vec<Video>,
    ) -> Result<Vec<FeedVideo>, AppError> {
        let Some(viewer) = viewer else {
            return Ok(videos
                .into_iter()
                .map(|video| FeedVideo {
                    video,
                    is_saved: false,
                })
                .collect());
        };

        let ids: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
        let mut saved: HashSet<String> = HashSet::new();
        for batch in ids.chunks(IN_BATCH_SIZE) {
            saved.extend(self.store.saved_ids_among(viewer, batch).await?);
        }

        Ok(videos
            .into_iter()
            .map(|video| {
                let is_saved = saved.contains(&video.video_id);
                FeedVideo { video, is_saved }
            })
            .collect())
    }
}
