//! # Session / Profile Store
//!
//! A `Session` is the acting identity passed explicitly into every service
//! call. `SessionStore` owns the current one for a long-lived client and
//! notifies subscribers whenever sign-in, sign-out or a profile refresh
//! replaces it.

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Profile;
use crate::traits::ProfileRepo;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user_id: Option<Uuid>,
    profile: Option<Profile>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// `profile` may be missing if the account exists but its profile row
    /// could not be loaded; such a session cannot act.
    pub fn signed_in(user_id: Uuid, profile: Option<Profile>) -> Self {
        Self { user_id: Some(user_id), profile }
    }

    pub fn for_profile(profile: Profile) -> Self {
        Self { user_id: Some(profile.user_id), profile: Some(profile) }
    }

    pub fn acting_profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn authenticated_user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn is_banned(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.banned)
    }
}

pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::anonymous());
        Self { tx }
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Loads the profile for `user_id` and makes it the acting identity.
    pub async fn sign_in(&self, user_id: Uuid, profiles: &dyn ProfileRepo) -> Result<Session> {
        let profile = profiles
            .get_profile_by_user(user_id)
            .await
            .map_err(AppError::from_backend)?;
        let session = Session::signed_in(user_id, profile);
        self.tx.send_replace(session.clone());
        log::debug!("session established for account {user_id}");
        Ok(session)
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(Session::anonymous());
        log::debug!("session cleared");
    }

    /// Re-reads the acting profile (e.g. after an edit or a moderation
    /// change). A failed read clears the profile but keeps the account.
    pub async fn refresh(&self, profiles: &dyn ProfileRepo) -> Session {
        let Some(user_id) = self.current().authenticated_user_id() else {
            return Session::anonymous();
        };
        let profile = match profiles.get_profile_by_user(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                log::error!("error fetching profile for {user_id}: {err:#}");
                None
            }
        };
        let session = Session::signed_in(user_id, profile);
        self.tx.send_replace(session.clone());
        session
    }
}
