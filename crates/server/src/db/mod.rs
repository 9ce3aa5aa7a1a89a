//! Database operations for the store's `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `users` - Accounts, including cart, purchases, and the live refresh
//!   token; the row is the unit of persistence and of serialization
//!   (last write wins, no version column)
//! - `games` - The catalog; read-only at runtime
//! - `orders` - Immutable checkout records
//!
//! # Store seams
//!
//! Services depend on the [`UserStore`], [`CatalogStore`], and
//! [`OrderStore`] traits rather than concrete repositories, so the same
//! logic runs against Postgres in production and the in-memory store in
//! unit tests.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p replay-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use replay_core::{GameId, Role, UserId, Username};

use crate::models::{Game, NewOrder, Order, User};

pub mod games;
pub mod orders;
pub mod users;

#[cfg(test)]
pub mod memory;

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer parses as its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Persistence seam for the user row.
pub trait UserStore {
    /// Insert a new user with an empty cart and no purchases.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    fn create(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Fetch a user by id.
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Fetch a user by unique username.
    fn find_by_username(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Fetch the user whose stored refresh token equals `token`.
    fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Write the full user row back. Last write wins.
    fn save(&self, user: &User) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All users, for the admin listing.
    fn list(&self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;
}

/// Read-only catalog lookups. The authoritative price source.
pub trait CatalogStore {
    /// Fetch a game by id.
    fn find_by_id(
        &self,
        id: GameId,
    ) -> impl Future<Output = Result<Option<Game>, RepositoryError>> + Send;

    /// Fetch every game whose id appears in `ids`. Missing ids are simply
    /// absent from the result; callers decide whether that is a fault.
    fn find_many_by_ids(
        &self,
        ids: &[GameId],
    ) -> impl Future<Output = Result<Vec<Game>, RepositoryError>> + Send;
}

/// Order persistence, including the checkout commit.
pub trait OrderStore {
    /// Persist the order and the updated user row in one atomic unit.
    ///
    /// The caller passes the user with the cart already merged into
    /// purchases; this method writes both records or neither.
    fn commit_checkout(
        &self,
        user: &User,
        order: NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Order history for a user, newest first.
    fn find_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
