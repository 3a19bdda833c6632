//! Announcement Repository: admin-gated CRUD over the feed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::feed;
use crate::gate;
use crate::models::{
    Announcement, AnnouncementCounts, AnnouncementPatch, AnnouncementView, MediaBucket,
    NewAnnouncement, UploadedImage,
};
use crate::session::Session;
use crate::traits::{AnnouncementRepo, MediaStore};
use crate::validation;

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepo>,
    media: Arc<dyn MediaStore>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepo>, media: Arc<dyn MediaStore>) -> Self {
        Self { repo, media }
    }

    /// The whole feed, pinned first, newest first within each group.
    pub async fn list(&self) -> Result<Vec<AnnouncementView>> {
        let mut views = self
            .repo
            .list_announcements()
            .await
            .map_err(AppError::from_backend)?;
        feed::sort_announcements(&mut views);
        log::debug!("fetched {} announcements", views.len());
        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<AnnouncementView> {
        self.repo
            .get_announcement(id)
            .await
            .map_err(AppError::from_backend)?
            .ok_or_else(|| AppError::not_found("Announcement", id))
    }

    pub async fn create(&self, session: &Session, draft: NewAnnouncement) -> Result<AnnouncementView> {
        let author = gate::require_admin(session, "create announcements")?;
        let title = validation::text("title", &draft.title, validation::TITLE_MAX)?;
        let content = validation::text("content", &draft.content, validation::ANNOUNCEMENT_MAX)?;

        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::now_v7(),
            title,
            content,
            author_id: author.id,
            image_url: draft.image_url.filter(|url| !url.trim().is_empty()),
            is_pinned: draft.is_pinned.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.repo
            .insert_announcement(announcement.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!("announcement {} created by {}", announcement.id, author.username);
        Ok(AnnouncementView {
            announcement,
            author: Some(author.clone()),
            counts: AnnouncementCounts::default(),
        })
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        patch: AnnouncementPatch,
    ) -> Result<AnnouncementView> {
        let editor = gate::require_admin(session, "update announcements")?;
        if patch.is_empty() {
            return Err(AppError::ValidationError("nothing to update".into()));
        }
        let title = patch
            .title
            .as_deref()
            .map(|t| validation::text("title", t, validation::TITLE_MAX))
            .transpose()?;
        let content = patch
            .content
            .as_deref()
            .map(|c| validation::text("content", c, validation::ANNOUNCEMENT_MAX))
            .transpose()?;

        let mut view = self.get(id).await?;
        let announcement = &mut view.announcement;
        if let Some(title) = title {
            announcement.title = title;
        }
        if let Some(content) = content {
            announcement.content = content;
        }
        if let Some(url) = patch.image_url {
            announcement.image_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(pinned) = patch.is_pinned {
            announcement.is_pinned = pinned;
        }
        announcement.updated_at = Utc::now();

        self.repo
            .update_announcement(announcement.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!("announcement {id} updated by {}", editor.username);
        Ok(view)
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
        let admin = gate::require_admin(session, "delete announcements")?;
        let deleted = self
            .repo
            .delete_announcement(id)
            .await
            .map_err(AppError::from_backend)?;
        if !deleted {
            return Err(AppError::not_found("Announcement", id));
        }
        log::info!("announcement {id} deleted by {}", admin.username);
        Ok(())
    }

    /// Stores an image for use as an announcement's `image_url`.
    pub async fn upload_image(
        &self,
        session: &Session,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedImage> {
        let admin = gate::require_admin(session, "upload announcement images")?;
        validation::image_upload(&data, content_type)?;
        let media_id = self
            .media
            .save_upload(data, content_type, MediaBucket::Announcements)
            .await
            .map_err(AppError::from_backend)?;
        log::info!("announcement image {media_id} uploaded by {}", admin.username);
        Ok(UploadedImage {
            url: self.media.get_url(MediaBucket::Announcements, &media_id),
            thumbnail_url: self.media.get_thumbnail_url(MediaBucket::Announcements, &media_id),
        })
    }
}
