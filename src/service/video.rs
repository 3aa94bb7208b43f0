//! Video metadata service
//!
//! Create/read/update/delete on video documents, engagement counters, and
//! save/unsave bookmarking. Ownership checks live here; handlers only
//! validate shape.

use std::sync::Arc;

use chrono::Utc;

use super::feed::FeedVideo;
use crate::data::{Category, EngagementKind, EntityId, Store, Video};
use crate::error::AppError;
use crate::metrics::ENGAGEMENT_EVENTS_TOTAL;

/// Validated input for creating a video document
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: i64,
}

/// Validated partial update; every field optional
#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub thumbnail_url: Option<String>,
}

impl VideoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.thumbnail_url.is_none()
    }
}

pub struct VideoService {
    store: Arc<Store>,
}

impl VideoService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a video document attributed to `uploader_id`.
    ///
    /// Uploader name and picture are snapshotted from the profile at this
    /// moment; a later profile change does not rewrite existing videos.
    /// Registration is not a precondition for uploading, so a missing
    /// profile falls back to the token email for attribution.
    pub async fn create(
        &self,
        uploader_id: &str,
        uploader_email: &str,
        input: NewVideo,
    ) -> Result<Video, AppError> {
        let profile = self.store.get_user(uploader_id).await?;
        let (uploader_name, uploader_profile_pic) = match &profile {
            Some(profile) => (
                profile.display_name.clone(),
                profile.profile_pic_url.clone().unwrap_or_default(),
            ),
            None => (uploader_email.to_string(), String::new()),
        };

        let now = Utc::now();
        let video = Video {
            video_id: EntityId::new().0,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.as_str().to_string(),
            video_url: input.video_url,
            thumbnail_url: input.thumbnail_url,
            duration: input.duration,
            uploader_id: uploader_id.to_string(),
            uploader_name,
            uploader_profile_pic,
            view_count: 0,
            completion_count: 0,
            skip_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_video(&video).await?;
        if profile.is_some() {
            self.store.adjust_total_uploads(uploader_id, 1).await?;
        }

        tracing::info!(video_id = %video.video_id, uploader = %uploader_id, "Video created");
        Ok(video)
    }

    /// Fetch one video, annotated with the viewer's save status.
    pub async fn get(&self, video_id: &str, viewer: Option<&str>) -> Result<FeedVideo, AppError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(AppError::video_not_found)?;

        let is_saved = match viewer {
            Some(viewer) => self.store.is_bookmarked(viewer, video_id).await?,
            None => false,
        };

        Ok(FeedVideo { video, is_saved })
    }

    /// Apply an allow-listed patch, uploader-only.
    ///
    /// Fails 404 before 403 so a caller probing someone else's video id
    /// learns nothing beyond its existence.
    pub async fn update(
        &self,
        caller_uid: &str,
        video_id: &str,
        patch: VideoPatch,
    ) -> Result<Video, AppError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(AppError::video_not_found)?;

        if video.uploader_id != caller_uid {
            return Err(AppError::Forbidden(
                "You can only update your own videos".to_string(),
            ));
        }

        if !patch.is_empty() {
            self.store
                .update_video_fields(
                    video_id,
                    patch.title.as_deref().map(str::trim),
                    patch.description.as_deref().map(str::trim),
                    patch.category.map(|c| c.as_str()),
                    patch.thumbnail_url.as_deref(),
                    Utc::now(),
                )
                .await?;
        }

        let updated = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(AppError::video_not_found)?;
        Ok(updated)
    }

    /// Delete a video, uploader-only, cascading bookmark cleanup.
    ///
    /// Two non-transactional steps; a save landing between them leaves an
    /// orphaned bookmark the saved feed already tolerates by dropping
    /// entries whose video is gone.
    pub async fn delete(&self, caller_uid: &str, video_id: &str) -> Result<(), AppError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(AppError::video_not_found)?;

        if video.uploader_id != caller_uid {
            return Err(AppError::Forbidden(
                "You can only delete your own videos".to_string(),
            ));
        }

        self.store.delete_video(video_id).await?;
        let removed = self.store.delete_bookmarks_by_video(video_id).await?;
        self.store.adjust_total_uploads(caller_uid, -1).await?;

        tracing::info!(
            video_id = %video_id,
            bookmarks_removed = removed,
            "Video deleted"
        );
        Ok(())
    }

    /// Record one engagement event (atomic counter increment).
    pub async fn track(&self, video_id: &str, kind: EngagementKind) -> Result<(), AppError> {
        let incremented = self.store.increment_engagement(video_id, kind).await?;
        if !incremented {
            return Err(AppError::video_not_found());
        }

        ENGAGEMENT_EVENTS_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();
        Ok(())
    }

    /// Save a video for a user (idempotent).
    ///
    /// The existence check and the write are two separate store calls; a
    /// delete racing in between can strand a bookmark, which the cascade
    /// and the saved feed both tolerate.
    pub async fn save(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        if self.store.get_video(video_id).await?.is_none() {
            return Err(AppError::video_not_found());
        }

        self.store
            .upsert_bookmark(user_id, video_id, Utc::now())
            .await?;
        Ok(())
    }

    /// Remove a saved video (idempotent; absent bookmark is success).
    pub async fn unsave(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        self.store.delete_bookmark(user_id, video_id).await?;
        Ok(())
    }
}
