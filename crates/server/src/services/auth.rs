//! Account lifecycle and session credentials.
//!
//! Registration, login, refresh rotation, and logout. A user holds at
//! most one live refresh token; every successful login or rotation
//! replaces it, so a presented refresh token is single-use.
//!
//! Passwords are hashed with Argon2id and never stored or logged in
//! clear text.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use thiserror::Error;

use replay_core::{Role, Username, UsernameError};

use crate::db::{RepositoryError, UserStore};
use crate::models::User;
use crate::services::tokens::{TokenError, TokenPair, TokenService};

/// Minimum password length for new accounts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Refresh token unknown, expired, or superseded.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Username already registered.
    #[error("username already exists")]
    UsernameTaken,

    /// Username failed domain validation.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Password failed the strength requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Token minting failed.
    #[error("token error: {0}")]
    TokenIssue(#[from] TokenError),

    /// Underlying store failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}

/// An authenticated session: the user plus a fresh credential pair.
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

/// Account and session operations over a [`UserStore`].
pub struct AuthService<'a, S> {
    users: S,
    tokens: &'a TokenService,
}

impl<'a, S: UserStore + Sync> AuthService<'a, S> {
    pub const fn new(users: S, tokens: &'a TokenService) -> Self {
        Self { users, tokens }
    }

    /// Create an account and log it straight in.
    ///
    /// # Errors
    ///
    /// - `InvalidUsername` if the username fails validation
    /// - `WeakPassword` if the password is too short
    /// - `UsernameTaken` if the username is already registered
    pub async fn register(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&username, &password_hash, Role::User)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        self.open_session(user).await
    }

    /// Verify credentials and open a session.
    ///
    /// A malformed or unknown username and a wrong password all produce
    /// the same `InvalidCredentials`, so login probes learn nothing.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        // Only a credential-checked login counts as a last login;
        // registration and rotation leave the timestamp alone.
        user.last_login = Some(Utc::now());

        tracing::info!(user_id = %user.id, "User logged in");

        self.open_session(user).await
    }

    /// Rotate a presented refresh token into a new credential pair.
    ///
    /// The presented token must equal the one stored on the user row.
    /// If the stored token matches but no longer verifies (expired or
    /// tampered), it is cleared so it cannot be retried.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRefreshToken` for unknown, superseded, expired,
    /// or mismatched tokens.
    pub async fn rotate(&self, presented: &str) -> Result<Session, AuthError> {
        let mut user = self
            .users
            .find_by_refresh_token(presented)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        match self.tokens.verify_refresh_token(presented) {
            Ok(claims) if claims.sub == user.id.to_string() => {}
            _ => {
                // Stored token is stale or forged; revoke it outright
                user.refresh_token = None;
                self.users.save(&user).await?;
                tracing::warn!(user_id = %user.id, "Revoked unverifiable refresh token");
                return Err(AuthError::InvalidRefreshToken);
            }
        }

        self.open_session(user).await
    }

    /// Invalidate the session behind a presented refresh token.
    ///
    /// Unknown tokens are a no-op; logout never fails for the client's
    /// lack of a live session.
    pub async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        if let Some(mut user) = self.users.find_by_refresh_token(presented).await? {
            user.refresh_token = None;
            self.users.save(&user).await?;
            tracing::info!(user_id = %user.id, "User logged out");
        }

        Ok(())
    }

    /// Mint a credential pair and persist the refresh side on the row.
    async fn open_session(&self, mut user: User) -> Result<Session, AuthError> {
        let tokens = self.tokens.issue_pair(&user)?;

        user.refresh_token = Some(tokens.refresh.clone());
        self.users.save(&user).await?;

        Ok(Session { user, tokens })
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::config::TokenConfig;
    use crate::db::memory::MemoryStore;

    use super::*;

    fn token_service() -> TokenService {
        TokenService::new(&TokenConfig {
            access_secret: SecretString::from("kX9mQ2vL8nR4wZ7jF1bT6yH3cP5dG0aS"),
            refresh_secret: SecretString::from("qW3eR5tY7uI9oP1aS2dF4gH6jK8lZ0xC"),
            access_ttl_secs: 60,
            refresh_ttl_secs: 3600,
        })
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        let session = auth.register("alice", "correct-horse").await.expect("registers");
        assert_eq!(session.user.username.as_str(), "alice");
        assert!(session.user.refresh_token.is_some());
        assert!(session.user.last_login.is_none());

        let session = auth.login("alice", "correct-horse").await.expect("logs in");
        assert!(session.user.last_login.is_some());
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        assert!(matches!(
            auth.register("alice", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        auth.register("alice", "correct-horse").await.expect("first registers");
        assert!(matches!(
            auth.register("alice", "battery-staple").await,
            Err(AuthError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn login_wrong_password_is_invalid_credentials() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        auth.register("alice", "correct-horse").await.expect("registers");
        assert!(matches!(
            auth.login("alice", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn login_unknown_user_is_invalid_credentials() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        assert!(matches!(
            auth.login("nobody", "whatever-pw").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn rotation_is_single_use() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        let session = auth.register("alice", "correct-horse").await.expect("registers");
        let first_refresh = session.tokens.refresh;

        let rotated = auth.rotate(&first_refresh).await.expect("rotates");
        assert_ne!(rotated.tokens.refresh, first_refresh);

        // The superseded token no longer matches the stored one
        assert!(matches!(
            auth.rotate(&first_refresh).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn rotation_does_not_stamp_last_login() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        let session = auth.register("alice", "correct-horse").await.expect("registers");
        assert_eq!(store.user(session.user.id).expect("exists").last_login, None);

        let rotated = auth.rotate(&session.tokens.refresh).await.expect("rotates");
        assert_eq!(rotated.user.last_login, None);
        assert_eq!(store.user(session.user.id).expect("exists").last_login, None);
    }

    #[tokio::test]
    async fn expired_stored_refresh_token_is_revoked() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        let session = auth.register("alice", "correct-horse").await.expect("registers");
        let user_id = session.user.id;

        // Replace the stored token with one that is already expired
        let expired_service = TokenService::new(&TokenConfig {
            access_secret: SecretString::from("kX9mQ2vL8nR4wZ7jF1bT6yH3cP5dG0aS"),
            refresh_secret: SecretString::from("qW3eR5tY7uI9oP1aS2dF4gH6jK8lZ0xC"),
            access_ttl_secs: 60,
            refresh_ttl_secs: -5,
        });
        let mut user = store.user(user_id).expect("exists");
        let expired = expired_service
            .issue_refresh_token(&user)
            .expect("signs");
        user.refresh_token = Some(expired.clone());
        UserStore::save(&&store, &user).await.expect("saves");

        assert!(matches!(
            auth.rotate(&expired).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        // The stale token was cleared as a side effect
        assert_eq!(store.user(user_id).expect("exists").refresh_token, None);
    }

    #[tokio::test]
    async fn logout_clears_stored_token_and_is_idempotent() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let auth = AuthService::new(&store, &tokens);

        let session = auth.register("alice", "correct-horse").await.expect("registers");
        let refresh = session.tokens.refresh;

        auth.logout(&refresh).await.expect("logs out");
        assert_eq!(store.user(session.user.id).expect("exists").refresh_token, None);

        // Second logout with the same token is a quiet no-op
        auth.logout(&refresh).await.expect("still ok");
        assert!(matches!(
            auth.rotate(&refresh).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }
}
