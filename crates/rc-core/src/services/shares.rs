use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gate;
use crate::models::Share;
use crate::session::Session;
use crate::traits::ShareRepo;

pub struct ShareService {
    repo: Arc<dyn ShareRepo>,
}

impl ShareService {
    pub fn new(repo: Arc<dyn ShareRepo>) -> Self {
        Self { repo }
    }

    /// Shares the announcement, or un-shares it if already shared.
    pub async fn toggle(&self, session: &Session, announcement_id: Uuid) -> Result<Option<Share>> {
        let profile = gate::require_active(session)?;
        let existing = self
            .repo
            .find_share(announcement_id, profile.id)
            .await
            .map_err(AppError::from_backend)?;

        if let Some(share) = existing {
            self.repo
                .delete_share(share.id)
                .await
                .map_err(AppError::from_backend)?;
            log::info!("{} unshared {announcement_id}", profile.username);
            return Ok(None);
        }

        let share = Share {
            id: Uuid::now_v7(),
            announcement_id,
            user_id: profile.id,
            shared_at: Utc::now(),
        };
        self.repo
            .insert_share(share.clone())
            .await
            .map_err(AppError::from_backend)?;
        log::info!("{} shared {announcement_id}", profile.username);
        Ok(Some(share))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::traits::MockShareRepo;

    #[tokio::test]
    async fn toggles_on_then_off() {
        let session = Session::for_profile(Profile::new(Uuid::now_v7(), "crier".into(), "Crier".into()));
        let announcement_id = Uuid::now_v7();

        let mut repo = MockShareRepo::new();
        let mut shared: Option<Share> = None;
        repo.expect_find_share().times(2).returning(move |_, _| {
            let current = shared.clone();
            if current.is_none() {
                shared = Some(Share {
                    id: Uuid::now_v7(),
                    announcement_id: Uuid::nil(),
                    user_id: Uuid::nil(),
                    shared_at: Utc::now(),
                });
            }
            Ok(current)
        });
        repo.expect_insert_share().times(1).returning(|_| Ok(()));
        repo.expect_delete_share().times(1).returning(|_| Ok(()));

        let svc = ShareService::new(Arc::new(repo));
        let first = svc.toggle(&session, announcement_id).await.unwrap();
        assert_eq!(first.map(|s| s.announcement_id), Some(announcement_id));
        assert_eq!(svc.toggle(&session, announcement_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn banned_profiles_cannot_share() {
        let mut profile = Profile::new(Uuid::now_v7(), "crier".into(), "Crier".into());
        profile.banned = true;
        let svc = ShareService::new(Arc::new(MockShareRepo::new()));
        assert!(matches!(
            svc.toggle(&Session::for_profile(profile), Uuid::now_v7()).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
