//! CLI command implementations.

pub mod admin;
pub mod migrate;

/// Resolve the database URL from the environment.
///
/// `REPLAY_DATABASE_URL` wins; `DATABASE_URL` is the fallback so the
/// sqlx tooling and the CLI can share one variable.
pub fn database_url() -> Option<String> {
    std::env::var("REPLAY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
