//! # Authorization Gate
//!
//! Pure predicates over (profile, resource) plus the `require_*` helpers the
//! services call before touching any backend. A refusal here means no write
//! was attempted.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Profile;
use crate::session::Session;

pub fn is_authenticated(profile: Option<&Profile>) -> bool {
    profile.is_some()
}

pub fn is_admin(profile: &Profile) -> bool {
    profile.is_admin
}

/// `owner_id` is a profile id (authors, reacting users).
pub fn is_self(profile: &Profile, owner_id: Uuid) -> bool {
    profile.id == owner_id
}

/// The acting profile, provided it exists and is not banned.
pub fn require_active(session: &Session) -> Result<&Profile> {
    let profile = session
        .acting_profile()
        .ok_or_else(|| AppError::Unauthenticated("sign in required".into()))?;
    if profile.banned {
        log::warn!("banned profile {} attempted a mutation", profile.id);
        return Err(AppError::Forbidden("account banned".into()));
    }
    Ok(profile)
}

pub fn require_admin<'a>(session: &'a Session, action: &str) -> Result<&'a Profile> {
    let profile = require_active(session)?;
    if !is_admin(profile) {
        log::warn!("profile {} refused: only admins can {action}", profile.id);
        return Err(AppError::Forbidden(format!("only admins can {action}")));
    }
    Ok(profile)
}

pub fn require_self(profile: &Profile, owner_id: Uuid, action: &str) -> Result<()> {
    if is_self(profile, owner_id) {
        return Ok(());
    }
    log::warn!("profile {} refused: not the owner, cannot {action}", profile.id);
    Err(AppError::Forbidden(format!("only the author can {action}")))
}

pub fn require_self_or_admin(profile: &Profile, owner_id: Uuid, action: &str) -> Result<()> {
    if is_self(profile, owner_id) || is_admin(profile) {
        return Ok(());
    }
    log::warn!("profile {} refused: neither owner nor admin, cannot {action}", profile.id);
    Err(AppError::Forbidden(format!("only the author or an admin can {action}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(is_admin: bool, banned: bool) -> Profile {
        let mut p = Profile::new(Uuid::now_v7(), "tester".into(), "Tester".into());
        p.is_admin = is_admin;
        p.banned = banned;
        p
    }

    #[test]
    fn anonymous_sessions_are_unauthenticated() {
        assert!(!is_authenticated(Session::anonymous().acting_profile()));
        assert!(matches!(
            require_active(&Session::anonymous()),
            Err(AppError::Unauthenticated(_))
        ));
        let orphan = Session::signed_in(Uuid::now_v7(), None);
        assert!(matches!(require_active(&orphan), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn banned_profiles_cannot_act_even_as_admin() {
        let session = Session::for_profile(profile(true, true));
        assert_eq!(
            require_admin(&session, "post"),
            Err(AppError::Forbidden("account banned".into()))
        );
    }

    #[test]
    fn admin_gate() {
        assert!(require_admin(&Session::for_profile(profile(true, false)), "post").is_ok());
        assert!(matches!(
            require_admin(&Session::for_profile(profile(false, false)), "post"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn ownership_checks() {
        let member = profile(false, false);
        let admin = profile(true, false);
        let other = Uuid::now_v7();

        assert!(require_self(&member, member.id, "edit").is_ok());
        assert!(require_self(&admin, other, "edit").is_err());
        assert!(require_self_or_admin(&admin, other, "delete").is_ok());
        assert!(require_self_or_admin(&member, other, "delete").is_err());
    }
}
