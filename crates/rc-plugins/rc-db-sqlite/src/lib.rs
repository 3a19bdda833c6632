//! # rc-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rc-core` domain models. One `SqliteStore` backs every repository
//! port; the binary hands the same `Arc` to each service.

mod schema;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rc_core::error::AppError;
use rc_core::models::{
    Account, Announcement, AnnouncementCounts, AnnouncementView, Comment, CommentView, Profile,
    Reaction, ReactionKind, Share,
};
use rc_core::traits::{AccountRepo, AnnouncementRepo, CommentRepo, ProfileRepo, ReactionRepo, ShareRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

const PROFILE_COLUMNS: &str = "id, user_id, username, display_name, avatar_url, bio, \
     is_admin, banned, created_at, updated_at";

/// Author columns joined onto announcement and comment queries, prefixed `p_`.
const AUTHOR_COLUMNS: &str = "p.id AS p_id, p.user_id AS p_user_id, p.username AS p_username, \
     p.display_name AS p_display_name, p.avatar_url AS p_avatar_url, p.bio AS p_bio, \
     p.is_admin AS p_is_admin, p.banned AS p_banned, p.created_at AS p_created_at, \
     p.updated_at AS p_updated_at";

const ANNOUNCEMENT_SELECT: &str = "SELECT a.id, a.title, a.content, a.author_id, a.image_url, \
     a.is_pinned, a.created_at, a.updated_at, {AUTHOR}, \
     (SELECT COUNT(*) FROM reactions r WHERE r.announcement_id = a.id) AS reaction_count, \
     (SELECT COUNT(*) FROM comments c WHERE c.announcement_id = a.id) AS comment_count, \
     (SELECT COUNT(*) FROM shares s WHERE s.announcement_id = a.id) AS share_count \
     FROM announcements a LEFT JOIN profiles p ON p.id = a.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.announcement_id, c.user_id, c.content, c.parent_id, \
     c.created_at, c.updated_at, {AUTHOR} \
     FROM comments c LEFT JOIN profiles p ON p.id = c.user_id";

impl SqliteStore {
    /// Connects (creating the file if needed) and applies the schema.
    /// `sqlite::memory:` databases are pinned to a single connection so every
    /// query sees the same data.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready at {url}");
        Ok(Self { pool })
    }
}

/// Lifts constraint violations into typed errors the services understand.
fn classify(err: sqlx::Error, duplicate: &str, missing: (&str, Uuid)) -> anyhow::Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("{duplicate} already exists")).into();
        }
        if db.is_foreign_key_violation() {
            return AppError::not_found(missing.0, missing.1).into();
        }
    }
    anyhow::Error::new(err)
}

fn with_author(select: &str) -> String {
    select.replace("{AUTHOR}", AUTHOR_COLUMNS)
}

fn profile_from_row(row: &SqliteRow, prefix: &str) -> anyhow::Result<Option<Profile>> {
    let col = |name: &str| format!("{prefix}{name}");
    let Some(id) = row.try_get::<Option<Uuid>, _>(col("id").as_str())? else {
        return Ok(None);
    };
    Ok(Some(Profile {
        id,
        user_id: row.try_get(col("user_id").as_str())?,
        username: row.try_get(col("username").as_str())?,
        display_name: row.try_get(col("display_name").as_str())?,
        avatar_url: row.try_get(col("avatar_url").as_str())?,
        bio: row.try_get(col("bio").as_str())?,
        is_admin: row.try_get(col("is_admin").as_str())?,
        banned: row.try_get(col("banned").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    }))
}

fn announcement_from_row(row: &SqliteRow) -> anyhow::Result<AnnouncementView> {
    let count = |name: &str| -> anyhow::Result<u64> { Ok(u64::try_from(row.try_get::<i64, _>(name)?)?) };
    Ok(AnnouncementView {
        announcement: Announcement {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            author_id: row.try_get("author_id")?,
            image_url: row.try_get("image_url")?,
            is_pinned: row.try_get("is_pinned")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        },
        author: profile_from_row(row, "p_")?,
        counts: AnnouncementCounts {
            reactions: count("reaction_count")?,
            comments: count("comment_count")?,
            shares: count("share_count")?,
        },
    })
}

fn comment_from_row(row: &SqliteRow) -> anyhow::Result<CommentView> {
    Ok(CommentView {
        comment: Comment {
            id: row.try_get("id")?,
            announcement_id: row.try_get("announcement_id")?,
            user_id: row.try_get("user_id")?,
            content: row.try_get("content")?,
            parent_id: row.try_get("parent_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        },
        author: profile_from_row(row, "p_")?,
    })
}

fn reaction_from_row(row: &SqliteRow) -> anyhow::Result<Reaction> {
    Ok(Reaction {
        id: row.try_get("id")?,
        announcement_id: row.try_get("announcement_id")?,
        user_id: row.try_get("user_id")?,
        kind: ReactionKind::from_str(row.try_get::<&str, _>("reaction_type")?)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountRepo for SqliteStore {
    async fn create_account(&self, account: Account, profile: Profile) -> anyhow::Result<()> {
        let id = account.id;
        let mut tx = self.pool.begin().await?;

        // 1. Insert Account
        sqlx::query("INSERT INTO accounts (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(account.id)
            .bind(account.email)
            .bind(account.password_hash)
            .bind(account.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, "email", ("Account", id)))?;

        // 2. Insert its Profile; dropping `tx` on failure rolls back step 1
        sqlx::query(&format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(profile.username)
        .bind(profile.display_name)
        .bind(profile.avatar_url)
        .bind(profile.bio)
        .bind(profile.is_admin)
        .bind(profile.banned)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, "username", ("Account", id)))?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> anyhow::Result<Account> {
            Ok(Account {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                password_hash: row.try_get("password_hash")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl ProfileRepo for SqliteStore {
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(|r| profile_from_row(r, "")).transpose()?.flatten())
    }

    async fn get_profile_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(|r| profile_from_row(r, "")).transpose()?.flatten())
    }

    async fn find_profile_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(|r| profile_from_row(r, "")).transpose()?.flatten())
    }

    async fn list_profiles(&self) -> anyhow::Result<Vec<Profile>> {
        let rows = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY display_name ASC"))
            .fetch_all(&self.pool)
            .await?;
        let mut profiles = Vec::with_capacity(rows.len());
        for row in &rows {
            profiles.extend(profile_from_row(row, "")?);
        }
        Ok(profiles)
    }

    async fn update_profile(&self, profile: Profile) -> anyhow::Result<()> {
        let id = profile.id;
        let result = sqlx::query(
            "UPDATE profiles SET username = ?, display_name = ?, avatar_url = ?, bio = ?, \
             is_admin = ?, banned = ?, updated_at = ? WHERE id = ?",
        )
        .bind(profile.username)
        .bind(profile.display_name)
        .bind(profile.avatar_url)
        .bind(profile.bio)
        .bind(profile.is_admin)
        .bind(profile.banned)
        .bind(profile.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "username", ("Profile", id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Profile", id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl AnnouncementRepo for SqliteStore {
    async fn list_announcements(&self) -> anyhow::Result<Vec<AnnouncementView>> {
        let sql = format!("{} ORDER BY a.is_pinned DESC, a.created_at DESC", with_author(ANNOUNCEMENT_SELECT));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        log::debug!("loaded {} announcement rows", rows.len());
        rows.iter().map(announcement_from_row).collect()
    }

    async fn get_announcement(&self, id: Uuid) -> anyhow::Result<Option<AnnouncementView>> {
        let sql = format!("{} WHERE a.id = ?", with_author(ANNOUNCEMENT_SELECT));
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(announcement_from_row).transpose()
    }

    async fn insert_announcement(&self, announcement: Announcement) -> anyhow::Result<()> {
        let author_id = announcement.author_id;
        sqlx::query(
            "INSERT INTO announcements (id, title, content, author_id, image_url, is_pinned, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(announcement.id)
        .bind(announcement.title)
        .bind(announcement.content)
        .bind(announcement.author_id)
        .bind(announcement.image_url)
        .bind(announcement.is_pinned)
        .bind(announcement.created_at)
        .bind(announcement.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "announcement", ("Profile", author_id)))?;
        Ok(())
    }

    async fn update_announcement(&self, announcement: Announcement) -> anyhow::Result<()> {
        let id = announcement.id;
        let result = sqlx::query(
            "UPDATE announcements SET title = ?, content = ?, image_url = ?, is_pinned = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(announcement.title)
        .bind(announcement.content)
        .bind(announcement.image_url)
        .bind(announcement.is_pinned)
        .bind(announcement.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Announcement", id).into());
        }
        Ok(())
    }

    async fn delete_announcement(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReactionRepo for SqliteStore {
    async fn find_reaction(&self, announcement_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Reaction>> {
        let row = sqlx::query(
            "SELECT id, announcement_id, user_id, reaction_type, created_at FROM reactions \
             WHERE announcement_id = ? AND user_id = ?",
        )
        .bind(announcement_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(reaction_from_row).transpose()
    }

    async fn insert_reaction(&self, reaction: Reaction) -> anyhow::Result<()> {
        let announcement_id = reaction.announcement_id;
        sqlx::query(
            "INSERT INTO reactions (id, announcement_id, user_id, reaction_type, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(reaction.id)
        .bind(reaction.announcement_id)
        .bind(reaction.user_id)
        .bind(reaction.kind.as_str())
        .bind(reaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "reaction", ("Announcement", announcement_id)))?;
        Ok(())
    }

    async fn update_reaction_kind(&self, id: Uuid, kind: ReactionKind) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE reactions SET reaction_type = ? WHERE id = ?")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Reaction", id).into());
        }
        Ok(())
    }

    async fn delete_reaction(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM reactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepo for SqliteStore {
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<CommentView>> {
        let sql = format!("{} WHERE c.id = ?", with_author(COMMENT_SELECT));
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_comments(&self, announcement_id: Uuid) -> anyhow::Result<Vec<CommentView>> {
        let sql = format!(
            "{} WHERE c.announcement_id = ? ORDER BY c.created_at ASC",
            with_author(COMMENT_SELECT)
        );
        let rows = sqlx::query(&sql).bind(announcement_id).fetch_all(&self.pool).await?;
        rows.iter().map(comment_from_row).collect()
    }

    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()> {
        let announcement_id = comment.announcement_id;
        sqlx::query(
            "INSERT INTO comments (id, announcement_id, user_id, content, parent_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.announcement_id)
        .bind(comment.user_id)
        .bind(comment.content)
        .bind(comment.parent_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "comment", ("Announcement", announcement_id)))?;
        Ok(())
    }

    async fn update_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        content: String,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(content)
            .bind(updated_at)
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ShareRepo for SqliteStore {
    async fn find_share(&self, announcement_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Share>> {
        let row = sqlx::query(
            "SELECT id, announcement_id, user_id, shared_at FROM shares WHERE announcement_id = ? AND user_id = ?",
        )
        .bind(announcement_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> anyhow::Result<Share> {
            Ok(Share {
                id: row.try_get("id")?,
                announcement_id: row.try_get("announcement_id")?,
                user_id: row.try_get("user_id")?,
                shared_at: row.try_get("shared_at")?,
            })
        })
        .transpose()
    }

    async fn insert_share(&self, share: Share) -> anyhow::Result<()> {
        let announcement_id = share.announcement_id;
        sqlx::query("INSERT INTO shares (id, announcement_id, user_id, shared_at) VALUES (?, ?, ?, ?)")
            .bind(share.id)
            .bind(share.announcement_id)
            .bind(share.user_id)
            .bind(share.shared_at)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "share", ("Announcement", announcement_id)))?;
        Ok(())
    }

    async fn delete_share(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM shares WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
