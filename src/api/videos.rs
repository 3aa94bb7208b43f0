//! Video and feed endpoints

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use super::{PageParams, message_only, success, success_with_message};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::{Category, EngagementKind};
use crate::error::AppError;
use crate::service::{FeedService, NewVideo, VideoPatch, VideoService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail_url: Option<String>,
}

fn invalid_category() -> AppError {
    AppError::Validation(
        "Invalid category. Must be one of: nature, philosophy, skills, art, science, other"
            .to_string(),
    )
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    Category::parse(raw).ok_or_else(invalid_category)
}

fn build_video_service(state: &AppState) -> VideoService {
    VideoService::new(state.store.clone())
}

fn build_feed_service(state: &AppState) -> FeedService {
    FeedService::new(state.store.clone())
}

/// POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?;

    let video_url = req
        .video_url
        .as_deref()
        .map(str::trim)
        .filter(|video_url| !video_url.is_empty())
        .ok_or_else(|| AppError::Validation("videoUrl is required".to_string()))?;
    if url::Url::parse(video_url).is_err() {
        return Err(AppError::Validation("videoUrl must be a valid URL".to_string()));
    }

    let category = req
        .category
        .as_deref()
        .ok_or_else(invalid_category)
        .and_then(parse_category)?;

    let duration = req.duration.unwrap_or(0);
    if duration < 0 {
        return Err(AppError::Validation(
            "duration cannot be negative".to_string(),
        ));
    }

    let video = build_video_service(&state)
        .create(
            &identity.uid,
            &identity.email,
            NewVideo {
                title: title.to_string(),
                description: req.description.unwrap_or_default(),
                category,
                video_url: video_url.to_string(),
                thumbnail_url: req.thumbnail_url.unwrap_or_default(),
                duration,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        success_with_message("Video uploaded successfully", video),
    ))
}

/// GET /api/videos/feed
pub async fn global_feed(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.resolve(&state.config.feed)?;
    let viewer = identity.as_ref().map(|i| i.uid.as_str());
    let feed = build_feed_service(&state).global_feed(viewer, &page).await?;
    Ok(success(feed))
}

/// GET /api/videos/following/feed
pub async fn following_feed(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.resolve(&state.config.feed)?;
    let feed = build_feed_service(&state)
        .following_feed(&identity.uid, &page)
        .await?;
    Ok(success(feed))
}

/// GET /api/videos/category/:category
pub async fn category_feed(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let category = parse_category(&category)?;
    let page = params.resolve(&state.config.feed)?;
    let viewer = identity.as_ref().map(|i| i.uid.as_str());
    let feed = build_feed_service(&state)
        .category_feed(category, viewer, &page)
        .await?;
    Ok(success(feed))
}

/// GET /api/videos/:videoId
pub async fn get_video(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = identity.as_ref().map(|i| i.uid.as_str());
    let video = build_video_service(&state).get(&video_id, viewer).await?;
    Ok(success(video))
}

/// POST /api/videos/:videoId/view
///
/// Anonymous views count too, so this route takes optional auth.
pub async fn track_view(
    State(state): State<AppState>,
    MaybeUser(_identity): MaybeUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    build_video_service(&state)
        .track(&video_id, EngagementKind::View)
        .await?;
    Ok(message_only("View tracked"))
}

/// POST /api/videos/:videoId/complete
pub async fn track_completion(
    State(state): State<AppState>,
    CurrentUser(_identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    build_video_service(&state)
        .track(&video_id, EngagementKind::Completion)
        .await?;
    Ok(message_only("Completion tracked"))
}

/// POST /api/videos/:videoId/skip
pub async fn track_skip(
    State(state): State<AppState>,
    CurrentUser(_identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    build_video_service(&state)
        .track(&video_id, EngagementKind::Skip)
        .await?;
    Ok(message_only("Skip tracked"))
}

/// PUT /api/videos/:videoId
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
    Json(req): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
    }
    let category = req.category.as_deref().map(parse_category).transpose()?;

    let video = build_video_service(&state)
        .update(
            &identity.uid,
            &video_id,
            VideoPatch {
                title: req.title,
                description: req.description,
                category,
                thumbnail_url: req.thumbnail_url,
            },
        )
        .await?;

    Ok(success_with_message("Video updated successfully", video))
}

/// DELETE /api/videos/:videoId
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    build_video_service(&state)
        .delete(&identity.uid, &video_id)
        .await?;
    Ok(message_only("Video deleted successfully"))
}

/// Create videos router
///
/// Static segments (`feed`, `following`, `category`) take precedence over
/// the `:videoId` capture in the route matcher.
pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_video))
        .route("/feed", get(global_feed))
        .route("/following/feed", get(following_feed))
        .route("/category/:category", get(category_feed))
        .route("/:videoId", get(get_video))
        .route("/:videoId", put(update_video))
        .route("/:videoId", delete(delete_video))
        .route("/:videoId/view", post(track_view))
        .route("/:videoId/complete", post(track_completion))
        .route("/:videoId/skip", post(track_skip))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_rejects_unknown_values() {
        assert!(parse_category("nature").is_ok());
        assert!(parse_category("Art").is_ok());
        assert!(matches!(
            parse_category("music"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn create_request_tolerates_missing_optionals() {
        let req: CreateVideoRequest = serde_json::from_str(
            r#"{"title": "t", "category": "art", "videoUrl": "https://cdn.example.com/v.mp4"}"#,
        )
        .unwrap();
        assert!(req.description.is_none());
        assert!(req.thumbnail_url.is_none());
        assert!(req.duration.is_none());
    }
}
