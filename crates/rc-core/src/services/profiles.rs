//! Own-profile editing and the admin user-management panel.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::feed;
use crate::gate;
use crate::models::{MediaBucket, ModerationPatch, Profile, ProfileUpdate, UploadedImage};
use crate::session::Session;
use crate::traits::{MediaStore, ProfileRepo};
use crate::validation;

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepo>,
    media: Arc<dyn MediaStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepo>, media: Arc<dyn MediaStore>) -> Self {
        Self { profiles, media }
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile> {
        self.profiles
            .get_profile(id)
            .await
            .map_err(AppError::from_backend)?
            .ok_or_else(|| AppError::not_found("Profile", id))
    }

    pub async fn update_own(&self, session: &Session, update: ProfileUpdate) -> Result<Profile> {
        let current = gate::require_active(session)?;
        let username = update.username.trim().to_string();
        validation::username(&username)?;
        validation::display_name(&update.display_name)?;
        let bio = update.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        if let Some(bio) = &bio {
            validation::bio(bio)?;
        }

        let taken = self
            .profiles
            .find_profile_by_username(&username)
            .await
            .map_err(AppError::from_backend)?
            .is_some_and(|other| other.id != current.id);
        if taken {
            return Err(AppError::Conflict("username already exists".into()));
        }

        // Work from the stored row so a stale session cannot roll back
        // moderation flags.
        let mut profile = self.get(current.id).await?;
        profile.username = username;
        profile.display_name = update.display_name.trim().to_string();
        profile.bio = bio;
        profile.updated_at = Utc::now();
        self.profiles
            .update_profile(profile.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!("profile {} updated", profile.id);
        Ok(profile)
    }

    /// Stores the image and points the acting profile's avatar at it.
    pub async fn set_avatar(&self, session: &Session, data: Vec<u8>, content_type: &str) -> Result<UploadedImage> {
        let current = gate::require_active(session)?;
        validation::image_upload(&data, content_type)?;

        let media_id = self
            .media
            .save_upload(data, content_type, MediaBucket::Avatars)
            .await
            .map_err(AppError::from_backend)?;
        let url = self.media.get_url(MediaBucket::Avatars, &media_id);
        let thumbnail_url = self.media.get_thumbnail_url(MediaBucket::Avatars, &media_id);

        let mut profile = self.get(current.id).await?;
        profile.avatar_url = Some(url.clone());
        profile.updated_at = Utc::now();
        self.profiles
            .update_profile(profile)
            .await
            .map_err(AppError::from_backend)?;

        log::info!("avatar updated for profile {}", current.id);
        Ok(UploadedImage { url, thumbnail_url })
    }

    /// Admin panel listing, ordered by display name.
    pub async fn list_for_admin(&self, session: &Session, query: Option<&str>) -> Result<Vec<Profile>> {
        gate::require_admin(session, "manage users")?;
        let profiles = self
            .profiles
            .list_profiles()
            .await
            .map_err(AppError::from_backend)?;
        Ok(feed::search_profiles(profiles, query))
    }

    /// Grants/revokes admin or bans/unbans another profile.
    pub async fn moderate(&self, session: &Session, target_id: Uuid, patch: ModerationPatch) -> Result<Profile> {
        let admin = gate::require_admin(session, "manage users")?;
        if gate::is_self(admin, target_id) {
            log::warn!("admin {} tried to change their own role flags", admin.username);
            return Err(AppError::Forbidden("admins cannot change their own admin or ban status".into()));
        }
        if patch.is_admin.is_none() && patch.banned.is_none() {
            return Err(AppError::ValidationError("nothing to update".into()));
        }

        let mut target = self.get(target_id).await?;
        if let Some(is_admin) = patch.is_admin {
            target.is_admin = is_admin;
        }
        if let Some(banned) = patch.banned {
            target.banned = banned;
        }
        target.updated_at = Utc::now();
        self.profiles
            .update_profile(target.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!(
            "admin {} set is_admin={} banned={} on {}",
            admin.username,
            target.is_admin,
            target.banned,
            target.username
        );
        Ok(target)
    }
}
