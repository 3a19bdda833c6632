//! Registration, sign-in and bearer-token resolution.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Account, Profile, Registration};
use crate::session::Session;
use crate::traits::{AccountRepo, AuthProvider, ProfileRepo};
use crate::validation;

const BAD_CREDENTIALS: &str = "invalid email or password";

pub struct AccountService {
    accounts: Arc<dyn AccountRepo>,
    profiles: Arc<dyn ProfileRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        profiles: Arc<dyn ProfileRepo>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self { accounts, profiles, auth }
    }

    /// Creates the account and its unprivileged profile.
    pub async fn register(&self, registration: Registration) -> Result<Profile> {
        let email = registration.email.trim().to_lowercase();
        let username = registration.username.trim().to_string();
        let display_name = registration.display_name.trim().to_string();
        validation::email(&email)?;
        validation::password(&registration.password)?;
        validation::username(&username)?;
        validation::display_name(&display_name)?;

        if self
            .accounts
            .find_account_by_email(&email)
            .await
            .map_err(AppError::from_backend)?
            .is_some()
        {
            return Err(AppError::Conflict("email already registered".into()));
        }
        if self
            .profiles
            .find_profile_by_username(&username)
            .await
            .map_err(AppError::from_backend)?
            .is_some()
        {
            return Err(AppError::Conflict("username already exists".into()));
        }

        let password_hash = self
            .auth
            .hash_password(&registration.password)
            .await
            .map_err(AppError::from_backend)?;
        let account = Account {
            id: Uuid::now_v7(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        let profile = Profile::new(account.id, username, display_name);

        self.accounts
            .create_account(account, profile.clone())
            .await
            .map_err(AppError::from_backend)?;

        log::info!("registered {} ({})", profile.username, profile.id);
        Ok(profile)
    }

    /// Returns a fresh bearer token and the session it opens.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(String, Session)> {
        let email = email.trim().to_lowercase();
        let account = self
            .accounts
            .find_account_by_email(&email)
            .await
            .map_err(AppError::from_backend)?
            .ok_or_else(|| AppError::Unauthenticated(BAD_CREDENTIALS.into()))?;

        if !self.auth.verify_password(password, &account.password_hash).await {
            log::warn!("failed sign-in for account {}", account.id);
            return Err(AppError::Unauthenticated(BAD_CREDENTIALS.into()));
        }

        let profile = self
            .profiles
            .get_profile_by_user(account.id)
            .await
            .map_err(AppError::from_backend)?;
        let token = self.auth.issue_token(account.id).map_err(AppError::from_backend)?;
        log::info!("account {} signed in", account.id);
        Ok((token, Session::signed_in(account.id, profile)))
    }

    pub fn sign_out(&self, token: &str) {
        self.auth.revoke_token(token);
    }

    /// Unknown or expired tokens yield an anonymous session.
    pub async fn session_for_token(&self, token: &str) -> Result<Session> {
        let Some(user_id) = self.auth.resolve_token(token) else {
            return Ok(Session::anonymous());
        };
        let profile = self
            .profiles
            .get_profile_by_user(user_id)
            .await
            .map_err(AppError::from_backend)?;
        Ok(Session::signed_in(user_id, profile))
    }
}
