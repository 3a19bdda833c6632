//! Read-side shaping: feed ordering, the two-level comment partition and the
//! admin panel's profile search.

use std::cmp::Reverse;
use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{AnnouncementView, CommentThread, CommentView, Profile};

/// Pinned first; newest first inside each pin group. Ties fall back to the
/// (time-ordered) id so the order is total.
pub fn sort_announcements(views: &mut [AnnouncementView]) {
    views.sort_by_key(|v| {
        let a = &v.announcement;
        (Reverse(a.is_pinned), Reverse(a.created_at), Reverse(a.id))
    });
}

/// Splits a flat comment list into top-level comments with their direct
/// replies, both oldest first. Replies to replies are not displayed.
pub fn partition_comments(mut comments: Vec<CommentView>) -> Vec<CommentThread> {
    comments.sort_by_key(|c| (c.comment.created_at, c.comment.id));

    let (top_level, replies): (Vec<_>, Vec<_>) = comments
        .into_iter()
        .partition(|c| c.comment.parent_id.is_none());

    let mut by_parent: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.comment.parent_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

/// Case-insensitive substring match on display name or username, ordered by
/// display name.
pub fn search_profiles(mut profiles: Vec<Profile>, query: Option<&str>) -> Vec<Profile> {
    if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
        let needle = q.to_lowercase();
        profiles.retain(|p| {
            p.display_name.to_lowercase().contains(&needle)
                || p.username.to_lowercase().contains(&needle)
        });
    }
    profiles.sort_by_cached_key(|p| (p.display_name.to_lowercase(), p.username.clone()));
    profiles
}
