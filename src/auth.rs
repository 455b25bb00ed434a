use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::models::user::User;
use crate::state::AppState;

pub const TOKEN_KIND_ACCESS: &str = "access";
pub const TOKEN_KIND_REFRESH: &str = "refresh";

/// JWT claims carried by both access and refresh tokens.
/// `kind` keeps the two from being interchangeable.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub kind: String,
}

/// Token pair returned by login, refresh and registration.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing material and lifetimes, derived from configuration once at startup.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl AuthKeys {
    pub fn new(config: &AuthConfig) -> Self {
        AuthKeys {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_lifetime_secs: config.access_token_lifetime.as_secs() as i64,
            refresh_lifetime_secs: config.refresh_token_lifetime.as_secs() as i64,
        }
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access: self.issue(user_id, TOKEN_KIND_ACCESS, self.access_lifetime_secs)?,
            refresh: self.issue(user_id, TOKEN_KIND_REFRESH, self.refresh_lifetime_secs)?,
        })
    }

    fn issue(&self, user_id: Uuid, kind: &str, lifetime_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now as usize,
            exp: (now + lifetime_secs) as usize,
            kind: kind.to_string(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))
    }

    /// Decodes a token and returns the subject, rejecting expired tokens and
    /// tokens of the wrong kind.
    pub fn decode(&self, token: &str, expected_kind: &str) -> Result<Uuid, ApiError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        if data.claims.kind != expected_kind {
            return Err(ApiError::unauthorized(format!(
                "Expected a {} token",
                expected_kind
            )));
        }

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ApiError::unauthorized("Invalid token subject"))
    }
}

/// パスワードを argon2id でハッシュ化する。ソルトは毎回ランダム生成。
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Stored password hash invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing Bearer token"))
}

/// Extractor for any authenticated account, verified or not.
/// Used by the profile and verification endpoints.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = state.auth.decode(token, TOKEN_KIND_ACCESS)?;

        let user = state
            .db
            .get_user_by_id(user_id)
            .await
            .map_err(|_| ApiError::unauthorized("Account no longer exists"))?;

        Ok(AuthUser(user))
    }
}

/// Extractor for authenticated accounts with a verified email address.
/// All vocabulary, generation and export endpoints require this.
pub struct VerifiedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_verified {
            return Err(ApiError::forbidden("Email address is not verified"));
        }

        Ok(VerifiedUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn keys() -> AuthKeys {
        AuthKeys::new(&AuthConfig {
            jwt_secret: "a-test-secret-that-is-long-enough!!".to_string(),
            access_token_lifetime: Duration::from_secs(3600),
            refresh_token_lifetime: Duration::from_secs(7200),
        })
    }

    #[test]
    fn test_token_roundtrip() {
        let keys = keys();
        let user_id = Uuid::new_v4();

        let pair = keys.issue_pair(user_id).unwrap();

        assert_eq!(keys.decode(&pair.access, TOKEN_KIND_ACCESS).unwrap(), user_id);
        assert_eq!(
            keys.decode(&pair.refresh, TOKEN_KIND_REFRESH).unwrap(),
            user_id
        );
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let keys = keys();
        let pair = keys.issue_pair(Uuid::new_v4()).unwrap();

        assert!(keys.decode(&pair.refresh, TOKEN_KIND_ACCESS).is_err());
        assert!(keys.decode(&pair.access, TOKEN_KIND_REFRESH).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let keys = keys();
        assert!(keys.decode("not.a.token", TOKEN_KIND_ACCESS).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correcthorse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correcthorse", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("correcthorse").unwrap();
        let second = hash_password("correcthorse").unwrap();
        assert_ne!(first, second);
    }
}
