//! Token issuing and verification.
//!
//! Two token kinds, both HS256-signed with separate secrets:
//!
//! - **Access tokens** are short-lived and stateless; the claims carry
//!   id, username, and role so guard checks need no store lookup beyond
//!   confirming the user still exists.
//! - **Refresh tokens** carry the subject, a longer expiry, and a random
//!   `jti` so every minted token is a distinct string; the issued string
//!   is persisted on the user row, and exactly one is valid per user at
//!   any time.
//!
//! Expiry validation runs with zero leeway so a token is invalid the
//! second it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use replay_core::{Role, UserId};

use crate::config::TokenConfig;
use crate::models::User;

/// Errors from token verification or signing.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token expired.
    #[error("token expired")]
    Expired,

    /// Signature, structure, or claim validation failed.
    #[error("invalid token")]
    Invalid,

    /// Token could not be signed (key material problem).
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id, stringified per JWT convention.
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// Parse the subject back into a [`UserId`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the subject is not a numeric id.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse::<UserId>().map_err(|_| TokenError::Invalid)
    }
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    /// Random per-issue id. Timestamps are second-resolution, so without
    /// this two tokens minted in the same second would be byte-identical
    /// and overwriting one with the other would revoke nothing.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Stateless token issuer and verifier.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Derive signing keys from configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let access_secret = config.access_secret.expose_secret().as_bytes();
        let refresh_secret = config.refresh_secret.expose_secret().as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
        }
    }

    /// Mint an access token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding).map_err(TokenError::Signing)
    }

    /// Mint a refresh token for `user`. The caller is responsible for
    /// persisting it onto the user row.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(TokenError::Signing)
    }

    /// Mint a full access/refresh pair.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if either encoding fails.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_access_token(user)?,
            refresh: self.issue_refresh_token(user)?,
        })
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` past the expiry instant and
    /// `TokenError::Invalid` for any other verification failure.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Verify a refresh token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` past the expiry instant and
    /// `TokenError::Invalid` for any other verification failure.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use replay_core::Username;
    use secrecy::SecretString;

    use super::*;

    fn test_user() -> User {
        User {
            id: UserId::new(7),
            username: Username::parse("player_one").expect("valid"),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            last_login: None,
            refresh_token: None,
            cart: BTreeSet::new(),
            purchases: BTreeSet::new(),
        }
    }

    fn service(access_ttl_secs: i64) -> TokenService {
        TokenService::new(&TokenConfig {
            access_secret: SecretString::from("kX9mQ2vL8nR4wZ7jF1bT6yH3cP5dG0aS"),
            refresh_secret: SecretString::from("qW3eR5tY7uI9oP1aS2dF4gH6jK8lZ0xC"),
            access_ttl_secs,
            refresh_ttl_secs: 60,
        })
    }

    #[test]
    fn round_trips_access_claims() {
        let svc = service(60);
        let token = svc.issue_access_token(&test_user()).expect("signs");
        let claims = svc.verify_access_token(&token).expect("verifies");
        assert_eq!(claims.user_id().expect("parses"), UserId::new(7));
        assert_eq!(claims.username, "player_one");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn valid_before_expiry_boundary() {
        // One-minute token verified immediately: well inside the boundary
        let svc = service(60);
        let token = svc.issue_access_token(&test_user()).expect("signs");
        assert!(svc.verify_access_token(&token).is_ok());
    }

    #[test]
    fn expired_after_boundary() {
        // Negative lifetime puts exp in the past; zero leeway makes it fail
        let svc = service(-5);
        let token = svc.issue_access_token(&test_user()).expect("signs");
        assert!(matches!(
            svc.verify_access_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_not_expired() {
        let svc = service(60);
        let token = svc.issue_access_token(&test_user()).expect("signs");
        // Refresh keys differ from access keys, so this must fail Invalid
        assert!(matches!(
            svc.verify_refresh_token(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = service(60);
        assert!(matches!(
            svc.verify_access_token("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn refresh_tokens_from_the_same_second_are_distinct() {
        let svc = service(60);
        let user = test_user();
        let first = svc.issue_refresh_token(&user).expect("signs");
        let second = svc.issue_refresh_token(&user).expect("signs");
        assert_ne!(first, second);

        let claims = svc.verify_refresh_token(&second).expect("verifies");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn access_token_does_not_verify_as_refresh_and_vice_versa() {
        let svc = service(60);
        let pair = svc.issue_pair(&test_user()).expect("signs");
        assert!(svc.verify_access_token(&pair.refresh).is_err());
        assert!(svc.verify_refresh_token(&pair.access).is_err());
    }
}
