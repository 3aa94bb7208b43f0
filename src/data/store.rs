//! Document-store adapter backed by SQLite
//!
//! All durable state goes through this module. The public surface is
//! deliberately limited to the operations a managed document store offers:
//! get-by-id, set, update-with-field-increment, delete, equality-filtered
//! ordered scans with limit/offset, bounded "value in set" lookups, and
//! batch delete. Cross-collection composition (joins, annotation) happens
//! in the service layer, never here.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Maximum number of ids a single "value in set" lookup accepts.
///
/// Callers issuing larger lookups must partition into batches and merge
/// the results themselves; see the feed assembler's fan-out helper.
pub const IN_BATCH_SIZE: usize = 10;

fn ensure_batch_size(operation: &str, ids: &[String]) -> Result<(), AppError> {
    if ids.len() > IN_BATCH_SIZE {
        return Err(AppError::Internal(anyhow::anyhow!(
            "{operation}: in-set lookup of {} ids exceeds the {IN_BATCH_SIZE}-id batch cap",
            ids.len()
        )));
    }
    Ok(())
}

fn in_placeholders(len: usize) -> String {
    vec!["?"; len].join(",")
}

/// Store connection pool wrapper.
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Connect to the SQLite database and run migrations.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Store connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // User profiles
    // =========================================================================

    /// Insert a profile only if none exists for this uid.
    ///
    /// Atomic at the SQL statement level, so concurrent registrations for
    /// the same uid cannot both succeed.
    ///
    /// # Returns
    /// `true` if the profile was created, `false` if one already existed.
    pub async fn insert_user_if_absent(&self, user: &UserProfile) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (
                uid, display_name, email, bio, profile_pic_url, created_at,
                strike_count, total_uploads, impact_score,
                follower_count, following_count, is_admin
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.uid)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(&user.profile_pic_url)
        .bind(user.created_at)
        .bind(user.strike_count)
        .bind(user.total_uploads)
        .bind(user.impact_score)
        .bind(user.follower_count)
        .bind(user.following_count)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get a user profile by uid
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        let user = sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Patch profile fields by uid.
    ///
    /// `display_name` can only be set; `bio` and `profile_pic_url` use
    /// `Some(None)` to clear and `None` for no change.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching profile row exists.
    pub async fn patch_user_profile(
        &self,
        uid: &str,
        display_name: Option<&str>,
        bio: Option<Option<&str>>,
        profile_pic_url: Option<Option<&str>>,
    ) -> Result<bool, AppError> {
        if display_name.is_none() && bio.is_none() && profile_pic_url.is_none() {
            // Treat a no-op patch as success if the profile exists.
            return Ok(self.get_user(uid).await?.is_some());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        if let Some(display_name) = display_name {
            fields.push("display_name = ");
            fields.push_bind_unseparated(display_name.to_string());
        }
        if let Some(bio) = bio {
            fields.push("bio = ");
            fields.push_bind_unseparated(bio.map(str::to_string));
        }
        if let Some(profile_pic_url) = profile_pic_url {
            fields.push("profile_pic_url = ");
            fields.push_bind_unseparated(profile_pic_url.map(str::to_string));
        }
        builder.push(" WHERE uid = ");
        builder.push_bind(uid.to_string());

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Adjust a user's upload counter by `delta` (field increment).
    ///
    /// Clamped at zero so a delete racing a failed create cannot drive
    /// the counter negative.
    pub async fn adjust_total_uploads(&self, uid: &str, delta: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET total_uploads = MAX(total_uploads + ?, 0) WHERE uid = ?")
            .bind(delta)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a user profile document.
    ///
    /// # Returns
    /// `true` if a profile was deleted.
    pub async fn delete_user(&self, uid: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Insert a new video document
    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                video_id, title, description, category, video_url, thumbnail_url,
                duration, uploader_id, uploader_name, uploader_profile_pic,
                view_count, completion_count, skip_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.category)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(video.duration)
        .bind(&video.uploader_id)
        .bind(&video.uploader_name)
        .bind(&video.uploader_profile_pic)
        .bind(video.view_count)
        .bind(video.completion_count)
        .bind(video.skip_count)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get video by ID
    pub async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// Count the entire video collection
    pub async fn count_videos(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Ordered scan over the whole collection, newest first.
    ///
    /// Ties on creation time break by video_id descending, which matches
    /// insertion order for time-ordered ULIDs.
    pub async fn list_videos(&self, limit: u32, offset: u64) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            ORDER BY created_at DESC, video_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Count videos with an exact category match
    pub async fn count_videos_in_category(&self, category: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE category = ?")
            .bind(category)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Ordered scan filtered by category
    pub async fn list_videos_in_category(
        &self,
        category: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE category = ?
            ORDER BY created_at DESC, video_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(category)
        .bind(limit)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Count videos uploaded by one user
    pub async fn count_videos_by_uploader(&self, uploader_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE uploader_id = ?")
                .bind(uploader_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Ordered scan filtered by uploader
    pub async fn list_videos_by_uploader(
        &self,
        uploader_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE uploader_id = ?
            ORDER BY created_at DESC, video_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(uploader_id)
        .bind(limit)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Ordered "uploader_id in set" lookup, at most [`IN_BATCH_SIZE`] ids.
    ///
    /// Each batch is individually ordered; merging across batches is the
    /// caller's job.
    pub async fn videos_by_uploaders(
        &self,
        uploader_ids: &[String],
    ) -> Result<Vec<Video>, AppError> {
        ensure_batch_size("videos_by_uploaders", uploader_ids)?;
        if uploader_ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT * FROM videos WHERE uploader_id IN ({}) ORDER BY created_at DESC, video_id DESC",
            in_placeholders(uploader_ids.len())
        );

        let mut query_builder = sqlx::query_as::<_, Video>(&query);
        for uploader_id in uploader_ids {
            query_builder = query_builder.bind(uploader_id);
        }

        let videos = query_builder.fetch_all(&self.pool).await?;
        Ok(videos)
    }

    /// "video_id in set" lookup, at most [`IN_BATCH_SIZE`] ids, unordered.
    pub async fn videos_by_ids(&self, video_ids: &[String]) -> Result<Vec<Video>, AppError> {
        ensure_batch_size("videos_by_ids", video_ids)?;
        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT * FROM videos WHERE video_id IN ({})",
            in_placeholders(video_ids.len())
        );

        let mut query_builder = sqlx::query_as::<_, Video>(&query);
        for video_id in video_ids {
            query_builder = query_builder.bind(video_id);
        }

        let videos = query_builder.fetch_all(&self.pool).await?;
        Ok(videos)
    }

    /// Patch the allow-listed video fields by id.
    ///
    /// Ownership is checked by the caller before invocation; this method
    /// only writes. `updated_at` is always stamped.
    pub async fn update_video_fields(
        &self,
        video_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        thumbnail_url: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE videos SET ");
        let mut fields = builder.separated(", ");
        if let Some(title) = title {
            fields.push("title = ");
            fields.push_bind_unseparated(title.to_string());
        }
        if let Some(description) = description {
            fields.push("description = ");
            fields.push_bind_unseparated(description.to_string());
        }
        if let Some(category) = category {
            fields.push("category = ");
            fields.push_bind_unseparated(category.to_string());
        }
        if let Some(thumbnail_url) = thumbnail_url {
            fields.push("thumbnail_url = ");
            fields.push_bind_unseparated(thumbnail_url.to_string());
        }
        fields.push("updated_at = ");
        fields.push_bind_unseparated(updated_at);
        builder.push(" WHERE video_id = ");
        builder.push_bind(video_id.to_string());

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a video document.
    ///
    /// # Returns
    /// `true` if a video was deleted.
    pub async fn delete_video(&self, video_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomic +1 on one engagement counter, stamping updated_at.
    ///
    /// # Returns
    /// `true` if a video row was incremented, `false` if the id is unknown.
    pub async fn increment_engagement(
        &self,
        video_id: &str,
        kind: EngagementKind,
    ) -> Result<bool, AppError> {
        let column = match kind {
            EngagementKind::View => "view_count",
            EngagementKind::Completion => "completion_count",
            EngagementKind::Skip => "skip_count",
        };

        let query = format!(
            "UPDATE videos SET {column} = {column} + 1, updated_at = ? WHERE video_id = ?"
        );

        let result = sqlx::query(&query)
            .bind(Utc::now())
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Idempotent save: upsert keyed by (user_id, video_id).
    ///
    /// Re-saving refreshes saved_at, moving the entry to the top of the
    /// saved feed like a fresh save would.
    pub async fn upsert_bookmark(
        &self,
        user_id: &str,
        video_id: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, video_id, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, video_id) DO UPDATE SET saved_at = excluded.saved_at
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .bind(saved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Idempotent unsave; no error if the bookmark is absent.
    pub async fn delete_bookmark(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND video_id = ?")
            .bind(user_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Point lookup of one (user, video) bookmark
    pub async fn is_bookmarked(&self, user_id: &str, video_id: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookmarks WHERE user_id = ? AND video_id = ?",
        )
        .bind(user_id)
        .bind(video_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// All of one user's bookmarks, most recently saved first.
    ///
    /// Returns the full list; the saved feed derives its total and page
    /// window from it before fetching any video bodies.
    pub async fn bookmarks_by_user(&self, user_id: &str) -> Result<Vec<Bookmark>, AppError> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT * FROM bookmarks
            WHERE user_id = ?
            ORDER BY saved_at DESC, video_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookmarks)
    }

    /// "video_id in set" bookmark presence for one user,
    /// at most [`IN_BATCH_SIZE`] ids.
    pub async fn saved_ids_among(
        &self,
        user_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, AppError> {
        ensure_batch_size("saved_ids_among", video_ids)?;
        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT video_id FROM bookmarks WHERE user_id = ? AND video_id IN ({})",
            in_placeholders(video_ids.len())
        );

        let mut query_builder = sqlx::query_scalar::<_, String>(&query);
        query_builder = query_builder.bind(user_id);
        for video_id in video_ids {
            query_builder = query_builder.bind(video_id);
        }

        let ids = query_builder.fetch_all(&self.pool).await?;
        Ok(ids)
    }

    /// Batch delete of every bookmark referencing a video (cascade).
    ///
    /// # Returns
    /// Number of bookmarks removed.
    pub async fn delete_bookmarks_by_video(&self, video_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Follow graph (read-only, plus a seed helper)
    // =========================================================================

    /// Ids of every user `follower_id` follows
    pub async fn following_ids(&self, follower_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created_at ASC",
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Insert one follow edge.
    ///
    /// The graph is owned by the social service; this exists for seeding
    /// fixtures and local development.
    pub async fn insert_follow(&self, follow: &Follow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&follow.follower_id)
        .bind(&follow.followee_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
