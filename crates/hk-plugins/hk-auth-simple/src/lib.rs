//! # hk-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and HS256 bearer tokens (access and refresh).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use hk_core::traits::{AuthProvider, TokenKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    /// "access" or "refresh"
    kind: String,
    iat: i64,
    exp: i64,
}

pub struct SimpleAuthProvider {
    secret: SecretString,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SimpleAuthProvider {
    pub fn new(secret: SecretString, access_ttl_hours: i64, refresh_ttl_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::hours(access_ttl_hours),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            kind: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;
        Ok(token)
    }

    fn verify_token(&self, token: &str, kind: TokenKind) -> anyhow::Result<Uuid> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.kind != kind.as_str() {
            anyhow::bail!("expected a {} token, got {}", kind.as_str(), data.claims.kind);
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SimpleAuthProvider {
        SimpleAuthProvider::new(SecretString::from("test-secret-with-enough-length"), 24, 30)
    }

    #[test]
    fn test_password_roundtrip() {
        let auth = provider();
        let hash = auth.hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("hunter22", &hash));
        assert!(!auth.verify_password("hunter23", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!provider().verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_kind_is_enforced() {
        let auth = provider();
        let user = Uuid::now_v7();

        let access = auth.issue_token(user, TokenKind::Access).unwrap();
        assert_eq!(auth.verify_token(&access, TokenKind::Access).unwrap(), user);
        assert!(auth.verify_token(&access, TokenKind::Refresh).is_err());

        let refresh = auth.issue_token(user, TokenKind::Refresh).unwrap();
        assert_eq!(auth.verify_token(&refresh, TokenKind::Refresh).unwrap(), user);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = provider().issue_token(Uuid::now_v7(), TokenKind::Access).unwrap();
        let other = SimpleAuthProvider::new(SecretString::from("a-completely-different-secret"), 24, 30);
        assert!(other.verify_token(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // negative TTL puts `exp` well beyond the default 60s leeway
        let auth = SimpleAuthProvider::new(SecretString::from("test-secret-with-enough-length"), -2, 30);
        let token = auth.issue_token(Uuid::now_v7(), TokenKind::Access).unwrap();
        assert!(auth.verify_token(&token, TokenKind::Access).is_err());
    }
}
