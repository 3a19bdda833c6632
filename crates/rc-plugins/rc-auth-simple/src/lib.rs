//! # rc-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and opaque bearer tokens held in process memory.

use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rc_core::traits::AuthProvider;
use uuid::Uuid;

const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

pub struct SimpleAuthProvider {
    /// token -> (account id, expiry)
    tokens: DashMap<String, (Uuid, DateTime<Utc>)>,
    ttl: Duration,
}

impl SimpleAuthProvider {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Drops every expired token. Resolution already ignores them.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut dropped = 0;
        self.tokens.retain(|_, (_, expires_at)| {
            let live = *expires_at > now;
            if !live {
                dropped += 1;
            }
            live
        });
        dropped
    }
}

fn random_bytes<const N: usize>() -> anyhow::Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("OS randomness unavailable: {e}"))?;
    Ok(buf)
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// PHC-formatted Argon2id hash with a fresh salt.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::encode_b64(&random_bytes::<SALT_BYTES>()?)
            .map_err(|e| anyhow!("salt encoding failed: {e}"))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(random_bytes::<TOKEN_BYTES>()?);
        self.tokens
            .insert(token.clone(), (user_id, Utc::now() + self.ttl));
        Ok(token)
    }

    fn resolve_token(&self, token: &str) -> Option<Uuid> {
        let (user_id, expires_at) = *self.tokens.get(token)?;
        if expires_at <= Utc::now() {
            self.tokens.remove(token);
            log::debug!("expired token for account {user_id} dropped");
            return None;
        }
        Some(user_id)
    }

    fn revoke_token(&self, token: &str) {
        self.tokens.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let auth = SimpleAuthProvider::new(Duration::hours(24));
        let hash = auth.hash_password("Sup3r$ecret").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("Sup3r$ecret", &hash).await);
        assert!(!auth.verify_password("sup3r$ecret", &hash).await);
        assert!(!auth.verify_password("Sup3r$ecret", "not-a-phc-string").await);
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let auth = SimpleAuthProvider::new(Duration::hours(24));
        let a = auth.hash_password("Sup3r$ecret").await.unwrap();
        let b = auth.hash_password("Sup3r$ecret").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_resolves_until_revoked() {
        let auth = SimpleAuthProvider::new(Duration::hours(24));
        let user = Uuid::now_v7();
        let token = auth.issue_token(user).unwrap();
        assert_eq!(token.len(), 43);
        assert_eq!(auth.resolve_token(&token), Some(user));
        assert_eq!(auth.resolve_token("forged"), None);

        auth.revoke_token(&token);
        assert_eq!(auth.resolve_token(&token), None);
    }

    #[test]
    fn expired_token_is_rejected_and_dropped() {
        let auth = SimpleAuthProvider::new(Duration::seconds(-1));
        let token = auth.issue_token(Uuid::now_v7()).unwrap();
        assert_eq!(auth.resolve_token(&token), None);
        assert!(auth.tokens.is_empty());
    }

    #[test]
    fn purge_counts_removed_tokens() {
        let stale = SimpleAuthProvider::new(Duration::seconds(-1));
        stale.issue_token(Uuid::now_v7()).unwrap();
        stale.issue_token(Uuid::now_v7()).unwrap();
        assert_eq!(stale.purge_expired(), 2);
        assert_eq!(stale.purge_expired(), 0);
    }

    #[test]
    fn purge_keeps_live_tokens_and_counts_only_expired_ones() {
        let auth = SimpleAuthProvider::new(Duration::hours(1));
        let user = Uuid::now_v7();
        let live = auth.issue_token(user).unwrap();
        auth.tokens
            .insert("old".into(), (Uuid::now_v7(), Utc::now() - Duration::minutes(5)));
        assert_eq!(auth.purge_expired(), 1);
        assert_eq!(auth.resolve_token(&live), Some(user));
    }

    #[test]
    fn purge_runs_alongside_sign_ins() {
        let auth = std::sync::Arc::new(SimpleAuthProvider::new(Duration::seconds(-1)));
        let issuer = auth.clone();
        let handle = std::thread::spawn(move || {
            for _ in 0..500 {
                issuer.issue_token(Uuid::now_v7()).unwrap();
            }
        });
        let mut dropped = 0;
        while !handle.is_finished() {
            dropped += auth.purge_expired();
        }
        handle.join().unwrap();
        dropped += auth.purge_expired();
        assert_eq!(dropped, 500);
    }
}
