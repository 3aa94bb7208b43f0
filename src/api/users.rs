//! User endpoints: uploaded videos and the saved list

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use serde_json::json;

use super::{PageParams, success};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{FeedService, VideoService};

fn build_feed_service(state: &AppState) -> FeedService {
    FeedService::new(state.store.clone())
}

/// GET /api/users/:userId/videos
///
/// Public listing of one user's uploads.
pub async fn user_videos(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.resolve(&state.config.feed)?;
    let feed = build_feed_service(&state).user_feed(&user_id, &page).await?;
    Ok(success(feed))
}

/// GET /api/users/me/saved
pub async fn saved_videos(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.resolve(&state.config.feed)?;
    let feed = build_feed_service(&state)
        .saved_feed(&identity.uid, &page)
        .await?;
    Ok(success(feed))
}

/// POST /api/users/me/saved/:videoId
pub async fn save_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    VideoService::new(state.store.clone())
        .save(&identity.uid, &video_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Video saved",
        "data": { "isSaved": true },
    })))
}

/// DELETE /api/users/me/saved/:videoId
pub async fn unsave_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    VideoService::new(state.store.clone())
        .unsave(&identity.uid, &video_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Video removed from saved",
        "data": { "isSaved": false },
    })))
}

/// Create users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/me/saved", get(saved_videos))
        .route("/me/saved/:videoId", post(save_video))
        .route("/me/saved/:videoId", delete(unsave_video))
        .route("/:userId/videos", get(user_videos))
}
