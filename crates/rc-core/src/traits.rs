//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Repositories return `anyhow::Result`; an adapter that can classify a
//! failure wraps an [`AppError`](crate::AppError) so services can recover it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Account, Announcement, AnnouncementView, Comment, CommentView, MediaBucket, Profile,
    Reaction, ReactionKind, Share,
};

/// Login identities (e-mail + password hash).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Writes the account and its profile together or not at all.
    /// A taken e-mail or username fails with `AppError::Conflict`.
    async fn create_account(&self, account: Account, profile: Profile) -> anyhow::Result<()>;
    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn get_profile_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn find_profile_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>>;
    async fn list_profiles(&self) -> anyhow::Result<Vec<Profile>>;
    /// Overwrites every mutable column of the stored row with `profile`.
    async fn update_profile(&self, profile: Profile) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AnnouncementRepo: Send + Sync {
    /// All announcements with author and counts; order is not guaranteed.
    async fn list_announcements(&self) -> anyhow::Result<Vec<AnnouncementView>>;
    async fn get_announcement(&self, id: Uuid) -> anyhow::Result<Option<AnnouncementView>>;
    async fn insert_announcement(&self, announcement: Announcement) -> anyhow::Result<()>;
    async fn update_announcement(&self, announcement: Announcement) -> anyhow::Result<()>;
    /// Reactions, comments and shares go with it (storage-side cascade).
    async fn delete_announcement(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Keyed by (announcement, reacting profile).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReactionRepo: Send + Sync {
    async fn find_reaction(&self, announcement_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Reaction>>;
    /// Must fail with `AppError::Conflict` if the pair already has a reaction.
    async fn insert_reaction(&self, reaction: Reaction) -> anyhow::Result<()>;
    async fn update_reaction_kind(&self, id: Uuid, kind: ReactionKind) -> anyhow::Result<()>;
    async fn delete_reaction(&self, id: Uuid) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<CommentView>>;
    /// Every comment on the announcement, flat, authors attached.
    async fn list_comments(&self, announcement_id: Uuid) -> anyhow::Result<Vec<CommentView>>;
    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()>;
    /// Row-filtered on the author; returns false when no row matched.
    async fn update_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        content: String,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// Replies go with their parent (storage-side cascade).
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ShareRepo: Send + Sync {
    async fn find_share(&self, announcement_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Share>>;
    /// Must fail with `AppError::Conflict` if the pair already has a share.
    async fn insert_share(&self, share: Share) -> anyhow::Result<()>;
    async fn delete_share(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Media storage contract for avatars and announcement images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media_id.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str, bucket: MediaBucket) -> anyhow::Result<String>;
    /// Returns the public URL of the original media.
    fn get_url(&self, bucket: MediaBucket, media_id: &str) -> String;
    /// Returns the public URL of the generated thumbnail.
    fn get_thumbnail_url(&self, bucket: MediaBucket, media_id: &str) -> String;
}

/// Credential hashing and bearer-token sessions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues an opaque token bound to an account id.
    fn issue_token(&self, user_id: Uuid) -> anyhow::Result<String>;
    /// `None` for unknown or expired tokens.
    fn resolve_token(&self, token: &str) -> Option<Uuid>;
    fn revoke_token(&self, token: &str);
}
