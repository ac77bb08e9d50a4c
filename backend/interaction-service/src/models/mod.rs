/// Data models for interaction-service
///
/// This module defines structures for:
/// - UserProfile / NewPost: validated write inputs
/// - PostView: a post annotated with read-time aggregates for one viewer
/// - ModerationVerdict / Issue: the structured outcome of classifying text
/// - Outcome enums returned by the store and the service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Maximum post length in characters
pub const MAX_CONTENT_CHARS: u64 = 280;

/// Maximum display name length in characters
pub const MAX_DISPLAY_NAME_CHARS: u64 = 64;

/// Author profile used to render posts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Post creation input after trimming, checked before moderation runs
#[derive(Debug, Clone, Validate)]
pub struct NewPost {
    pub author_id: Uuid,
    #[validate(length(min = 1, max = 280))]
    pub content: String,
    pub parent_post_id: Option<Uuid>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// A post as seen by one viewer. Counts are computed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub content: String,
    pub parent_post_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub reply_count: i64,
    pub is_liked_by_me: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_image_url: Option<String>,
}

// ============================================
// Moderation
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Clean,
    Flagged,
    Error,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Clean => "clean",
            VerdictStatus::Flagged => "flagged",
            VerdictStatus::Error => "error",
        }
    }
}

/// One finding reported by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// 1 = minor, 5 = extremely dangerous
    pub severity: u8,
    pub reason: String,
}

impl Issue {
    pub const MIN_SEVERITY: u8 = 1;
    pub const MAX_SEVERITY: u8 = 5;

    pub fn system_error(reason: impl Into<String>) -> Self {
        Self {
            kind: "system error".to_string(),
            subtype: None,
            severity: Self::MAX_SEVERITY,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub status: VerdictStatus,
    pub issues: Vec<Issue>,
}

impl ModerationVerdict {
    pub fn clean() -> Self {
        Self {
            status: VerdictStatus::Clean,
            issues: Vec::new(),
        }
    }

    pub fn flagged(issues: Vec<Issue>) -> Self {
        Self {
            status: VerdictStatus::Flagged,
            issues,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Error,
            issues: vec![Issue::system_error(reason)],
        }
    }

    pub fn max_severity(&self) -> u8 {
        self.issues.iter().map(|i| i.severity).max().unwrap_or(0)
    }
}

// ============================================
// Outcomes
// ============================================

/// Store-level result of inserting a like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLikeOutcome {
    Created,
    AlreadyExists,
}

/// Store-level result of deleting a like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearLikeOutcome {
    Removed,
    NotFound,
}

/// Service-level like result, serialized as `{"status": "created" | "conflict"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LikeStatus {
    Created,
    Conflict,
}

impl From<SetLikeOutcome> for LikeStatus {
    fn from(outcome: SetLikeOutcome) -> Self {
        match outcome {
            SetLikeOutcome::Created => LikeStatus::Created,
            SetLikeOutcome::AlreadyExists => LikeStatus::Conflict,
        }
    }
}

/// Service-level unlike result, serialized as `{"status": "removed" | "not_found"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlikeStatus {
    Removed,
    NotFound,
}

impl From<ClearLikeOutcome> for UnlikeStatus {
    fn from(outcome: ClearLikeOutcome) -> Self {
        match outcome {
            ClearLikeOutcome::Removed => UnlikeStatus::Removed,
            ClearLikeOutcome::NotFound => UnlikeStatus::NotFound,
        }
    }
}

/// Result of a post creation attempt that reached a decision.
///
/// `Failed` is not a variant: a classifier that could not be consulted
/// surfaces as `AppError::ModerationUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreatePostOutcome {
    #[serde(rename_all = "camelCase")]
    Stored {
        post_id: Uuid,
        /// Flagged issues below the rejection threshold
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Issue>,
    },
    Rejected { issues: Vec<Issue> },
}

// ============================================
// Notifications
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Reply,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Reply => "reply",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(NotificationKind::Like),
            "reply" => Some(NotificationKind::Reply),
            _ => None,
        }
    }
}

/// Derived at read time from likes and replies on the recipient's posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub actor_id: Uuid,
    pub actor_display_name: String,
    pub post_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_post_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Maximum notifications returned per read
pub const NOTIFICATION_LIMIT: i64 = 100;
