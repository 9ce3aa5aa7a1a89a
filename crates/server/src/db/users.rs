//! User repository for database operations.
//!
//! The whole row is read and written together: cart and purchases are
//! integer-array columns on `users`, not separate tables, mirroring the
//! single-document shape the data model is built around.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use replay_core::{GameId, Role, UserId, Username};

use super::{RepositoryError, UserStore};
use crate::models::User;

/// Raw `users` row before domain validation.
#[derive(FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    cart: Vec<i32>,
    purchases: Vec<i32>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let role = self.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            username,
            password_hash: self.password_hash,
            role,
            created_at: self.created_at,
            last_login: self.last_login,
            refresh_token: self.refresh_token,
            cart: to_id_set(&self.cart),
            purchases: to_id_set(&self.purchases),
        })
    }
}

fn to_id_set(ids: &[i32]) -> BTreeSet<GameId> {
    ids.iter().copied().map(GameId::new).collect()
}

fn to_i32_vec(ids: &BTreeSet<GameId>) -> Vec<i32> {
    ids.iter().map(|id| id.as_i32()).collect()
}

const USER_COLUMNS: &str =
    "id, username, password_hash, role, created_at, last_login, refresh_token, cart, purchases";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        bind: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(bind)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }
}

impl UserStore for UserRepository<'_> {
    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let query = format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(username.as_str())
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("username already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.into_user()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("username = $1", username.as_str())
            .await
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("refresh_token = $1", token).await
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET username = $2, password_hash = $3, role = $4, \
             last_login = $5, refresh_token = $6, cart = $7, purchases = $8 \
             WHERE id = $1",
        )
        .bind(user.id.as_i32())
        .bind(user.username.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.last_login)
        .bind(user.refresh_token.as_deref())
        .bind(to_i32_vec(&user.cart))
        .bind(to_i32_vec(&user.purchases))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }
}
