//! Reaction Toggle.
//!
//! Read-then-write without isolation: two concurrent first reactions by the
//! same profile race, and the storage adapter's unique (announcement, user)
//! constraint turns the loser into `AppError::Conflict`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gate;
use crate::models::{Reaction, ReactionKind};
use crate::session::Session;
use crate::traits::ReactionRepo;

pub struct ReactionService {
    repo: Arc<dyn ReactionRepo>,
}

impl ReactionService {
    pub fn new(repo: Arc<dyn ReactionRepo>) -> Self {
        Self { repo }
    }

    /// Creates, re-kinds or removes the acting profile's reaction.
    /// Returns `None` when the reaction was removed.
    pub async fn toggle(
        &self,
        session: &Session,
        announcement_id: Uuid,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>> {
        let profile = gate::require_active(session)?;
        let existing = self
            .repo
            .find_reaction(announcement_id, profile.id)
            .await
            .map_err(AppError::from_backend)?;

        match existing {
            None => {
                let reaction = Reaction {
                    id: Uuid::now_v7(),
                    announcement_id,
                    user_id: profile.id,
                    kind,
                    created_at: Utc::now(),
                };
                self.repo
                    .insert_reaction(reaction.clone())
                    .await
                    .map_err(AppError::from_backend)?;
                log::info!("{} reacted {kind} to {announcement_id}", profile.username);
                Ok(Some(reaction))
            }
            Some(current) if current.kind == kind => {
                self.repo
                    .delete_reaction(current.id)
                    .await
                    .map_err(AppError::from_backend)?;
                log::info!("{} removed {kind} from {announcement_id}", profile.username);
                Ok(None)
            }
            Some(mut current) => {
                self.repo
                    .update_reaction_kind(current.id, kind)
                    .await
                    .map_err(AppError::from_backend)?;
                log::info!(
                    "{} changed reaction on {announcement_id} from {} to {kind}",
                    profile.username,
                    current.kind
                );
                current.kind = kind;
                Ok(Some(current))
            }
        }
    }

    /// The acting profile's reaction on an announcement, if any.
    pub async fn current(&self, session: &Session, announcement_id: Uuid) -> Result<Option<Reaction>> {
        let profile = session
            .acting_profile()
            .ok_or_else(|| AppError::Unauthenticated("sign in required".into()))?;
        self.repo
            .find_reaction(announcement_id, profile.id)
            .await
            .map_err(AppError::from_backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::traits::MockReactionRepo;

    fn member() -> Session {
        Session::for_profile(Profile::new(Uuid::now_v7(), "bard".into(), "Bard".into()))
    }

    fn existing(session: &Session, announcement_id: Uuid, kind: ReactionKind) -> Reaction {
        Reaction {
            id: Uuid::now_v7(),
            announcement_id,
            user_id: session.acting_profile().unwrap().id,
            kind,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_toggle_creates() {
        let session = member();
        let announcement_id = Uuid::now_v7();
        let mut repo = MockReactionRepo::new();
        repo.expect_find_reaction().returning(|_, _| Ok(None));
        repo.expect_insert_reaction()
            .withf(|r| r.kind == ReactionKind::Like)
            .times(1)
            .returning(|_| Ok(()));

        let svc = ReactionService::new(Arc::new(repo));
        let created = svc.toggle(&session, announcement_id, ReactionKind::Like).await.unwrap();
        let created = created.expect("reaction created");
        assert_eq!(created.user_id, session.acting_profile().unwrap().id);
        assert_eq!(created.announcement_id, announcement_id);
    }

    #[tokio::test]
    async fn same_kind_removes() {
        let session = member();
        let announcement_id = Uuid::now_v7();
        let current = existing(&session, announcement_id, ReactionKind::Like);
        let current_id = current.id;

        let mut repo = MockReactionRepo::new();
        repo.expect_find_reaction().returning(move |_, _| Ok(Some(current.clone())));
        repo.expect_delete_reaction()
            .withf(move |id| *id == current_id)
            .times(1)
            .returning(|_| Ok(()));

        let svc = ReactionService::new(Arc::new(repo));
        assert_eq!(svc.toggle(&session, announcement_id, ReactionKind::Like).await, Ok(None));
    }

    #[tokio::test]
    async fn different_kind_updates_in_place() {
        let session = member();
        let announcement_id = Uuid::now_v7();
        let current = existing(&session, announcement_id, ReactionKind::Like);
        let current_id = current.id;

        let mut repo = MockReactionRepo::new();
        repo.expect_find_reaction().returning(move |_, _| Ok(Some(current.clone())));
        repo.expect_update_reaction_kind()
            .withf(move |id, kind| *id == current_id && *kind == ReactionKind::Love)
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = ReactionService::new(Arc::new(repo));
        let updated = svc
            .toggle(&session, announcement_id, ReactionKind::Love)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, current_id);
        assert_eq!(updated.kind, ReactionKind::Love);
    }

    #[tokio::test]
    async fn lost_race_surfaces_conflict() {
        let mut repo = MockReactionRepo::new();
        repo.expect_find_reaction().returning(|_, _| Ok(None));
        repo.expect_insert_reaction().returning(|_| {
            Err(AppError::Conflict("reaction already exists".into()).into())
        });

        let svc = ReactionService::new(Arc::new(repo));
        assert!(matches!(
            svc.toggle(&member(), Uuid::now_v7(), ReactionKind::Like).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn anonymous_cannot_react() {
        let svc = ReactionService::new(Arc::new(MockReactionRepo::new()));
        assert!(matches!(
            svc.toggle(&Session::anonymous(), Uuid::now_v7(), ReactionKind::Like).await,
            Err(AppError::Unauthenticated(_))
        ));
    }
}
