use std::sync::Arc;

use super::*;
use rc_core::services::{AnnouncementService, CommentService, ReactionService, ShareService};
use rc_core::traits::MockMediaStore;
use rc_core::{NewAnnouncement, Session};

async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new("sqlite::memory:").await.expect("in-memory sqlite"))
}

/// Inserts an account and its profile directly, bypassing registration.
async fn seed_profile(store: &SqliteStore, username: &str, is_admin: bool) -> Profile {
    let account = Account {
        id: Uuid::now_v7(),
        email: format!("{username}@realm.test"),
        password_hash: "x".into(),
        created_at: Utc::now(),
    };
    let mut profile = Profile::new(account.id, username.into(), username.to_uppercase());
    profile.is_admin = is_admin;
    store.create_account(account, profile.clone()).await.unwrap();
    profile
}

fn announcements(store: &Arc<SqliteStore>) -> AnnouncementService {
    AnnouncementService::new(store.clone(), Arc::new(MockMediaStore::new()))
}

fn patch_notes(pinned: bool) -> NewAnnouncement {
    NewAnnouncement {
        title: "Patch 1.2".into(),
        content: "Fixes".into(),
        image_url: None,
        is_pinned: Some(pinned),
    }
}

#[tokio::test]
async fn profile_round_trips_and_username_is_unique() {
    let store = store().await;
    let profile = seed_profile(&store, "ranger", false).await;

    let by_user = store.get_profile_by_user(profile.user_id).await.unwrap().unwrap();
    assert_eq!(by_user.id, profile.id);
    assert_eq!(
        store.find_profile_by_username("ranger").await.unwrap().map(|p| p.id),
        Some(profile.id)
    );

    let account = Account {
        id: Uuid::now_v7(),
        email: "other@realm.test".into(),
        password_hash: "x".into(),
        created_at: Utc::now(),
    };
    let clash = Profile::new(account.id, "ranger".into(), "Other".into());
    let err = store.create_account(account, clash).await.unwrap_err();
    assert!(matches!(AppError::from_backend(err), AppError::Conflict(_)));
}

#[tokio::test]
async fn failed_profile_insert_leaves_no_account_behind() {
    let store = store().await;
    seed_profile(&store, "ranger", false).await;

    let account = Account {
        id: Uuid::now_v7(),
        email: "late@realm.test".into(),
        password_hash: "x".into(),
        created_at: Utc::now(),
    };
    let clash = Profile::new(account.id, "ranger".into(), "Late".into());
    assert!(store.create_account(account.clone(), clash).await.is_err());
    assert!(store.find_account_by_email("late@realm.test").await.unwrap().is_none());
    assert!(store.get_profile_by_user(account.id).await.unwrap().is_none());

    // The same e-mail can register once a free username is picked.
    let retry = Profile::new(account.id, "late_ranger".into(), "Late".into());
    store.create_account(account, retry).await.unwrap();
    assert!(store.find_account_by_email("late@realm.test").await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let store = store().await;
    seed_profile(&store, "ranger", false).await;
    let account = Account {
        id: Uuid::now_v7(),
        email: "ranger@realm.test".into(),
        password_hash: "x".into(),
        created_at: Utc::now(),
    };
    let profile = Profile::new(account.id, "other".into(), "Other".into());
    let err = store.create_account(account, profile).await.unwrap_err();
    assert!(matches!(AppError::from_backend(err), AppError::Conflict(_)));
    assert!(store.find_profile_by_username("other").await.unwrap().is_none());
}

#[tokio::test]
async fn pinned_announcement_leads_and_reaction_toggles_count() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let member = Session::for_profile(seed_profile(&store, "ranger", false).await);

    let feed = announcements(&store);
    feed.create(&admin, NewAnnouncement { title: "Older news".into(), ..patch_notes(false) })
        .await
        .unwrap();
    let created = feed.create(&admin, patch_notes(true)).await.unwrap();
    feed.create(&admin, NewAnnouncement { title: "Newest news".into(), ..patch_notes(false) })
        .await
        .unwrap();
    let id = created.announcement.id;

    let reactions = ReactionService::new(store.clone());
    reactions.toggle(&member, id, ReactionKind::Like).await.unwrap();

    let list = feed.list().await.unwrap();
    assert_eq!(list[0].announcement.id, id);
    assert_eq!(list[0].counts.reactions, 1);
    assert_eq!(list[0].author.as_ref().map(|a| a.username.as_str()), Some("warden"));
    assert_eq!(list[1].announcement.title, "Newest news");
    assert_eq!(list[2].announcement.title, "Older news");

    assert_eq!(reactions.toggle(&member, id, ReactionKind::Like).await.unwrap(), None);
    assert_eq!(feed.get(id).await.unwrap().counts.reactions, 0);

    let love = reactions.toggle(&member, id, ReactionKind::Love).await.unwrap().unwrap();
    assert_eq!(love.kind, ReactionKind::Love);
    let stored = reactions.current(&member, id).await.unwrap().unwrap();
    assert_eq!(stored.kind, ReactionKind::Love);
    assert_eq!(feed.get(id).await.unwrap().counts.reactions, 1);
}

#[tokio::test]
async fn storage_rejects_second_reaction_for_same_pair() {
    let store = store().await;
    let admin = seed_profile(&store, "warden", true).await;
    let feed = announcements(&store);
    let id = feed
        .create(&Session::for_profile(admin.clone()), patch_notes(false))
        .await
        .unwrap()
        .announcement
        .id;

    let reaction = |kind| Reaction {
        id: Uuid::now_v7(),
        announcement_id: id,
        user_id: admin.id,
        kind,
        created_at: Utc::now(),
    };
    store.insert_reaction(reaction(ReactionKind::Like)).await.unwrap();
    let err = store.insert_reaction(reaction(ReactionKind::Sad)).await.unwrap_err();
    assert!(matches!(AppError::from_backend(err), AppError::Conflict(_)));
}

#[tokio::test]
async fn storage_rejects_second_share_for_same_pair() {
    let store = store().await;
    let admin = seed_profile(&store, "warden", true).await;
    let feed = announcements(&store);
    let id = feed
        .create(&Session::for_profile(admin.clone()), patch_notes(false))
        .await
        .unwrap()
        .announcement
        .id;

    let share = || Share {
        id: Uuid::now_v7(),
        announcement_id: id,
        user_id: admin.id,
        shared_at: Utc::now(),
    };
    store.insert_share(share()).await.unwrap();
    let err = store.insert_share(share()).await.unwrap_err();
    assert!(matches!(AppError::from_backend(err), AppError::Conflict(_)));
    assert_eq!(feed.get(id).await.unwrap().counts.shares, 1);
}

#[tokio::test]
async fn reacting_to_missing_announcement_is_not_found() {
    let store = store().await;
    let member = Session::for_profile(seed_profile(&store, "ranger", false).await);
    let reactions = ReactionService::new(store.clone());
    assert!(matches!(
        reactions.toggle(&member, Uuid::now_v7(), ReactionKind::Like).await,
        Err(AppError::NotFound(..))
    ));
}

#[tokio::test]
async fn reply_nests_under_top_level_comment() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let u = Session::for_profile(seed_profile(&store, "ursula", false).await);
    let v = Session::for_profile(seed_profile(&store, "victor", false).await);
    let id = announcements(&store)
        .create(&admin, patch_notes(false))
        .await
        .unwrap()
        .announcement
        .id;

    let comments = CommentService::new(store.clone());
    let top = comments.add(&u, id, "Nice!", None).await.unwrap();
    let reply = comments.add(&v, id, "Agreed", Some(top.comment.id)).await.unwrap();

    let threads = comments.list(id).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].comment.comment.id, top.comment.id);
    assert_eq!(threads[0].comment.author.as_ref().map(|a| a.username.as_str()), Some("ursula"));
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].comment.id, reply.comment.id);
    assert_eq!(announcements(&store).get(id).await.unwrap().counts.comments, 2);
}

#[tokio::test]
async fn comment_edit_and_delete_rules_hold_against_storage() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let u = Session::for_profile(seed_profile(&store, "ursula", false).await);
    let v = Session::for_profile(seed_profile(&store, "victor", false).await);
    let id = announcements(&store)
        .create(&admin, patch_notes(false))
        .await
        .unwrap()
        .announcement
        .id;

    let comments = CommentService::new(store.clone());
    let top = comments.add(&u, id, "Nice!", None).await.unwrap();
    let cid = top.comment.id;
    comments.add(&v, id, "Agreed", Some(cid)).await.unwrap();

    assert!(matches!(comments.update(&v, cid, "Mine now").await, Err(AppError::Forbidden(_))));
    let edited = comments.update(&u, cid, "  Very nice!  ").await.unwrap();
    assert_eq!(edited.comment.content, "Very nice!");
    let stored = store.get_comment(cid).await.unwrap().unwrap();
    assert_eq!(stored.comment.content, "Very nice!");

    assert!(matches!(comments.delete(&v, cid).await, Err(AppError::Forbidden(_))));
    comments.delete(&admin, cid).await.unwrap();
    assert!(comments.list(id).await.unwrap().is_empty());
    assert_eq!(announcements(&store).get(id).await.unwrap().counts.comments, 0);
}

#[tokio::test]
async fn non_admin_mutations_leave_storage_untouched() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let member = Session::for_profile(seed_profile(&store, "ranger", false).await);
    let feed = announcements(&store);
    let original = feed.create(&admin, patch_notes(true)).await.unwrap();
    let id = original.announcement.id;

    assert!(matches!(feed.create(&member, patch_notes(false)).await, Err(AppError::Forbidden(_))));
    let patch = rc_core::AnnouncementPatch { title: Some("Hacked".into()), ..Default::default() };
    assert!(matches!(feed.update(&member, id, patch).await, Err(AppError::Forbidden(_))));
    assert!(matches!(feed.delete(&member, id).await, Err(AppError::Forbidden(_))));

    let list = feed.list().await.unwrap();
    assert_eq!(list.len(), 1);
    let stored = &list[0].announcement;
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, original.announcement.title);
    assert!(stored.is_pinned);
}

#[tokio::test]
async fn deleting_announcement_cascades() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let member = Session::for_profile(seed_profile(&store, "ranger", false).await);
    let feed = announcements(&store);
    let id = feed.create(&admin, patch_notes(false)).await.unwrap().announcement.id;

    ReactionService::new(store.clone())
        .toggle(&member, id, ReactionKind::Laugh)
        .await
        .unwrap();
    ShareService::new(store.clone()).toggle(&member, id).await.unwrap();
    let comment = CommentService::new(store.clone())
        .add(&member, id, "bye", None)
        .await
        .unwrap();

    feed.delete(&admin, id).await.unwrap();
    assert!(feed.list().await.unwrap().is_empty());
    assert!(store.get_comment(comment.comment.id).await.unwrap().is_none());
    let member_id = member.acting_profile().unwrap().id;
    assert!(store.find_reaction(id, member_id).await.unwrap().is_none());
    assert!(store.find_share(id, member_id).await.unwrap().is_none());
    assert!(matches!(feed.delete(&admin, id).await, Err(AppError::NotFound(..))));
}

#[tokio::test]
async fn share_toggles_and_counts() {
    let store = store().await;
    let admin = Session::for_profile(seed_profile(&store, "warden", true).await);
    let member = Session::for_profile(seed_profile(&store, "ranger", false).await);
    let feed = announcements(&store);
    let id = feed.create(&admin, patch_notes(false)).await.unwrap().announcement.id;

    let shares = ShareService::new(store.clone());
    assert!(shares.toggle(&member, id).await.unwrap().is_some());
    assert_eq!(feed.get(id).await.unwrap().counts.shares, 1);
    assert!(shares.toggle(&member, id).await.unwrap().is_none());
    assert_eq!(feed.get(id).await.unwrap().counts.shares, 0);
}
