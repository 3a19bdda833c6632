//! Comment Tree: flat storage, two-level rendering.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::feed;
use crate::gate;
use crate::models::{Comment, CommentThread, CommentView};
use crate::session::Session;
use crate::traits::CommentRepo;
use crate::validation;

pub struct CommentService {
    repo: Arc<dyn CommentRepo>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepo>) -> Self {
        Self { repo }
    }

    /// Top-level comments with their replies, oldest first.
    pub async fn list(&self, announcement_id: Uuid) -> Result<Vec<CommentThread>> {
        let comments = self
            .repo
            .list_comments(announcement_id)
            .await
            .map_err(AppError::from_backend)?;
        Ok(feed::partition_comments(comments))
    }

    /// A reply to a reply is anchored to the top-level comment so it stays
    /// visible in the single reply layer.
    pub async fn add(
        &self,
        session: &Session,
        announcement_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<CommentView> {
        let author = gate::require_active(session)?;
        let content = validation::text("comment", content, validation::COMMENT_MAX)?;

        let parent_id = match parent_id {
            Some(id) => {
                let parent = self.fetch(id).await?.comment;
                if parent.announcement_id != announcement_id {
                    return Err(AppError::ValidationError(
                        "parent comment belongs to another announcement".into(),
                    ));
                }
                Some(parent.parent_id.unwrap_or(parent.id))
            }
            None => None,
        };

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::now_v7(),
            announcement_id,
            user_id: author.id,
            content,
            parent_id,
            created_at: now,
            updated_at: now,
        };
        self.repo
            .insert_comment(comment.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!("comment {} added to {announcement_id} by {}", comment.id, author.username);
        Ok(CommentView { comment, author: Some(author.clone()) })
    }

    pub async fn update(&self, session: &Session, comment_id: Uuid, content: &str) -> Result<CommentView> {
        let editor = gate::require_active(session)?;
        let content = validation::text("comment", content, validation::COMMENT_MAX)?;
        let mut view = self.fetch(comment_id).await?;
        gate::require_self(editor, view.comment.user_id, "edit this comment")?;

        let now = Utc::now();
        let matched = self
            .repo
            .update_comment(comment_id, editor.id, content.clone(), now)
            .await
            .map_err(AppError::from_backend)?;
        if !matched {
            return Err(AppError::Forbidden("only the author can edit this comment".into()));
        }

        view.comment.content = content;
        view.comment.updated_at = now;
        log::info!("comment {comment_id} edited by {}", editor.username);
        Ok(view)
    }

    pub async fn delete(&self, session: &Session, comment_id: Uuid) -> Result<()> {
        let actor = gate::require_active(session)?;
        let view = self.fetch(comment_id).await?;
        gate::require_self_or_admin(actor, view.comment.user_id, "delete this comment")?;

        let deleted = self
            .repo
            .delete_comment(comment_id)
            .await
            .map_err(AppError::from_backend)?;
        if !deleted {
            return Err(AppError::not_found("Comment", comment_id));
        }
        log::info!("comment {comment_id} deleted by {}", actor.username);
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<CommentView> {
        self.repo
            .get_comment(id)
            .await
            .map_err(AppError::from_backend)?
            .ok_or_else(|| AppError::not_found("Comment", id))
    }
}
