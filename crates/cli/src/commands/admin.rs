//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! replay-cli admin create -u admin_user -p 'a-strong-password'
//! ```
//!
//! # Environment Variables
//!
//! - `REPLAY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use replay_core::{Role, Username};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No database URL in the environment.
    #[error("Missing environment variable: REPLAY_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid username.
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("User already exists with username: {0}")]
    UserExists(String),
}

/// Create a new admin user.
///
/// # Errors
///
/// Returns `AdminError` on validation failure, a duplicate username, or
/// a database fault.
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(username: &str, password: &str) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let username =
        Username::parse(username).map_err(|e| AdminError::InvalidUsername(e.to_string()))?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AdminError::PasswordHash)?
        .to_string();

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin user: {}", username);

    // Check if user already exists
    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(AdminError::UserExists(username.into_inner()));
    }

    // Create the user
    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username.as_str())
    .bind(&password_hash)
    .bind(Role::Admin.as_str())
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}",
        user_id,
        username
    );

    Ok(user_id)
}
