//! Catalog item domain type.
//!
//! Games are read-only from the store's perspective; prices here are the
//! only prices checkout will trust.

use serde::Serialize;
use sqlx::FromRow;

use replay_core::{GameId, Price};

/// A game in the catalog.
///
/// Field set carried over from the Steam-derived dataset the catalog is
/// seeded from. Review counts and concurrent-user figures are display
/// metadata; the core only ever reads `id` and `price`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub developer: String,
    pub publisher: String,
    pub genre: String,
    pub tags: Vec<String>,
    /// Current price in minor units.
    pub price: Price,
    /// Pre-discount price in minor units.
    pub initial_price: Price,
    /// Discount percentage (0-100).
    pub discount: i32,
    /// Positive review count.
    pub positive: i32,
    /// Negative review count.
    pub negative: i32,
    /// Peak concurrent users.
    pub ccu: i32,
}

/// Columns the public listing may sort by.
///
/// Whitelisted so a client-supplied sort field can be interpolated into
/// SQL safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSortField {
    Id,
    Name,
    Price,
    Positive,
    Ccu,
}

impl GameSortField {
    /// Column name for ORDER BY.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Positive => "positive",
            Self::Ccu => "ccu",
        }
    }

    /// Parse a client-supplied sort field, defaulting to `id`.
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("name") => Self::Name,
            Some("price") => Self::Price,
            Some("positive") => Self::Positive,
            Some("ccu") => Self::Ccu,
            _ => Self::Id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_whitelist() {
        assert_eq!(GameSortField::parse(Some("price")), GameSortField::Price);
        assert_eq!(GameSortField::parse(Some("name")), GameSortField::Name);
        // Anything unknown falls back to id, never raw SQL
        assert_eq!(
            GameSortField::parse(Some("price; DROP TABLE games")),
            GameSortField::Id
        );
        assert_eq!(GameSortField::parse(None), GameSortField::Id);
    }
}
