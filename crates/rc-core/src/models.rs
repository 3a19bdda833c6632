//! # Domain Models
//!
//! These structs represent the core entities of the community portal.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Login identity held by the authentication collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Application-level user identity carrying display metadata and role flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    /// The owning `Account`
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh, unprivileged profile for a newly registered account.
    pub fn new(user_id: Uuid, username: String, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            username,
            display_name,
            avatar_url: None,
            bio: None,
            is_admin: false,
            banned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub image_url: Option<String>,
    /// Pinned announcements sort before all others
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregates derived by storage at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementCounts {
    pub reactions: u64,
    pub comments: u64,
    pub shares: u64,
}

/// An announcement as the feed shows it: author attached, counts populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementView {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub author: Option<Profile>,
    #[serde(rename = "_count")]
    pub counts: AnnouncementCounts,
}

/// Input for `AnnouncementService::create`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub is_pinned: Option<bool>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_pinned: Option<bool>,
}

impl AnnouncementPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.image_url.is_none()
            && self.is_pinned.is_none()
    }
}

/// Fixed set of sentiment tags attachable to an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    #[default]
    Like,
    Love,
    Laugh,
    Angry,
    Sad,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Laugh,
        ReactionKind::Angry,
        ReactionKind::Sad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Angry => "angry",
            ReactionKind::Sad => "sad",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::ValidationError(format!("unknown reaction kind '{s}'")))
    }
}

/// At most one per (announcement, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "reaction_type")]
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

/// Stored flat; `parent_id == None` means top-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(rename = "user")]
    pub author: Option<Profile>,
}

/// A top-level comment and the replies anchored to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// At most one per (announcement, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub user_id: Uuid,
    pub shared_at: DateTime<Utc>,
}

/// Input for `AccountService::register`.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
}

/// Own-profile edits.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
}

/// Admin-only flag changes on another profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationPatch {
    pub is_admin: Option<bool>,
    pub banned: Option<bool>,
}

/// Public locations of a stored image and its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub thumbnail_url: String,
}

/// Which bucket an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBucket {
    Avatars,
    Announcements,
}

impl MediaBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaBucket::Avatars => "avatars",
            MediaBucket::Announcements => "announcements",
        }
    }
}
