//! Data models
//!
//! Rust structs representing document-store entities.
//! All models use ULID for store-generated IDs and chrono for timestamps.
//! Wire names are camelCase to match the persisted document schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

// =============================================================================
// User profile
// =============================================================================

/// A user's profile document
///
/// The `uid` comes from the identity provider; the profile is created once
/// on registration and rejects duplicate creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub strike_count: i64,
    /// Maintained by video create (+1) and delete (-1)
    pub total_uploads: i64,
    pub impact_score: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_admin: bool,
}

// =============================================================================
// Video
// =============================================================================

/// Video metadata document
///
/// The media itself lives in object storage; this record holds the
/// playback URLs plus denormalized uploader attribution snapshotted at
/// creation time (intentionally stale if the profile later changes).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub description: String,
    /// Always one of the six [`Category`] values, stored lowercase
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: String,
    /// Duration in seconds
    pub duration: i64,
    pub uploader_id: String,
    /// Uploader display name at creation time
    pub uploader_name: String,
    /// Uploader profile picture at creation time
    pub uploader_profile_pic: String,
    pub view_count: i64,
    pub completion_count: i64,
    pub skip_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Nature,
    Philosophy,
    Skills,
    Art,
    Science,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Philosophy => "philosophy",
            Self::Skills => "skills",
            Self::Art => "art",
            Self::Science => "science",
            Self::Other => "other",
        }
    }

    /// Parse a category, case-insensitively.
    ///
    /// Returns `None` for anything outside the six allowed values;
    /// nothing else may ever be persisted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "nature" => Some(Self::Nature),
            "philosophy" => Some(Self::Philosophy),
            "skills" => Some(Self::Skills),
            "art" => Some(Self::Art),
            "science" => Some(Self::Science),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Engagement counter selector for atomic increments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    View,
    Completion,
    Skip,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Completion => "completion",
            Self::Skip => "skip",
        }
    }
}

// =============================================================================
// Bookmark (saved-video relation)
// =============================================================================

/// A user's saved reference to a video
///
/// Keyed by the composite (user_id, video_id); exists only while the
/// referenced video exists (soft invariant, enforced by cascade delete).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub user_id: String,
    pub video_id: String,
    pub saved_at: DateTime<Utc>,
}

// =============================================================================
// Follow relation (read-only social graph)
// =============================================================================

/// A follower/followee pair
///
/// Owned by the social-graph service; this backend only reads it to
/// compute the following-feed candidate uploader set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}
