//! Catalog repository.
//!
//! Read-only at runtime; catalog rows are loaded out of band. Listing and
//! search exist for the public browse endpoints, the [`CatalogStore`]
//! trait carries only the lookups the core needs.

use serde::Serialize;
use sqlx::PgPool;

use replay_core::GameId;

use super::{CatalogStore, RepositoryError};
use crate::models::Game;
use crate::models::game::GameSortField;

const GAME_COLUMNS: &str = "id, name, developer, publisher, genre, tags, price, initial_price, \
                            discount, positive, negative, ccu";

/// Maximum page size for catalog listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A page of catalog results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl GamePage {
    fn new(games: Vec<Game>, page: i64, page_size: i64, total_count: i64) -> Self {
        // Equivalent to the (unstable on signed ints) `div_ceil`.
        let total_pages = total_count.div_euclid(page_size)
            + i64::from(total_count.rem_euclid(page_size) != 0);
        Self {
            games,
            page,
            page_size,
            total_count,
            total_pages,
            has_next_page: page.saturating_add(1).saturating_mul(page_size) < total_count,
            has_prev_page: page > 0,
        }
    }
}

/// Repository for catalog database operations.
pub struct GameRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GameRepository<'a> {
    /// Create a new game repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Paginated catalog listing. `page` is 0-indexed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn find_paginated(
        &self,
        page: i64,
        page_size: i64,
        sort: GameSortField,
        descending: bool,
    ) -> Result<GamePage, RepositoryError> {
        // sort column comes from the GameSortField whitelist, never the client
        let direction = if descending { "DESC" } else { "ASC" };
        let query = format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY {} {direction} LIMIT $1 OFFSET $2",
            sort.column()
        );

        let games = sqlx::query_as::<_, Game>(&query)
            .bind(page_size)
            .bind(offset(page, page_size))
            .fetch_all(self.pool)
            .await?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(self.pool)
            .await?;

        Ok(GamePage::new(games, page, page_size, total_count))
    }

    /// Case-insensitive substring search over game names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn search(
        &self,
        term: &str,
        page: i64,
        page_size: i64,
        sort: GameSortField,
        descending: bool,
    ) -> Result<GamePage, RepositoryError> {
        let direction = if descending { "DESC" } else { "ASC" };
        let pattern = format!("%{}%", escape_like(term));
        let query = format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE name ILIKE $1 \
             ORDER BY {} {direction} LIMIT $2 OFFSET $3",
            sort.column()
        );

        let games = sqlx::query_as::<_, Game>(&query)
            .bind(&pattern)
            .bind(page_size)
            .bind(offset(page, page_size))
            .fetch_all(self.pool)
            .await?;

        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE name ILIKE $1")
                .bind(&pattern)
                .fetch_one(self.pool)
                .await?;

        Ok(GamePage::new(games, page, page_size, total_count))
    }
}

impl CatalogStore for GameRepository<'_> {
    async fn find_by_id(&self, id: GameId) -> Result<Option<Game>, RepositoryError> {
        let query = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
        let game = sqlx::query_as::<_, Game>(&query)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(game)
    }

    async fn find_many_by_ids(&self, ids: &[GameId]) -> Result<Vec<Game>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let query = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ANY($1)");
        let games = sqlx::query_as::<_, Game>(&query)
            .bind(&raw_ids)
            .fetch_all(self.pool)
            .await?;

        Ok(games)
    }
}

/// Row offset for a 0-indexed page. Saturates so an absurd client page
/// number cannot wrap into a negative OFFSET.
fn offset(page: i64, page_size: i64) -> i64 {
    page.saturating_mul(page_size)
}

/// Escape LIKE metacharacters in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50% off_sale"), "50\\% off\\_sale");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn page_metadata() {
        let page = GamePage::new(Vec::new(), 2, 10, 35);
        assert_eq!(page.total_pages, 4);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);

        let last = GamePage::new(Vec::new(), 3, 10, 35);
        assert!(!last.has_next_page);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        assert_eq!(offset(i64::MAX, 100), i64::MAX);
        assert!(offset(i64::MAX, 100) > 0);

        let page = GamePage::new(Vec::new(), i64::MAX, 100, 35);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }
}
