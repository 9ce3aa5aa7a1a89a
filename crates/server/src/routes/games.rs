//! Public catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use replay_core::GameId;

use crate::db::CatalogStore;
use crate::db::games::{GamePage, GameRepository, MAX_PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::models::{Game, GameSortField};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Pagination and sort parameters for the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 0-indexed page number.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// One of the whitelisted sort fields; anything else sorts by id.
    pub sort: Option<String>,
    /// `asc` (default) or `desc`.
    pub order: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Result<i64> {
        match self.page {
            Some(page) if page < 0 => {
                Err(AppError::BadRequest("page must be non-negative".to_string()))
            }
            Some(page) => Ok(page),
            None => Ok(0),
        }
    }

    fn page_size(&self) -> Result<i64> {
        match self.page_size {
            Some(size) if !(1..=MAX_PAGE_SIZE).contains(&size) => Err(AppError::BadRequest(
                format!("page_size must be between 1 and {MAX_PAGE_SIZE}"),
            )),
            Some(size) => Ok(size),
            None => Ok(DEFAULT_PAGE_SIZE),
        }
    }

    fn sort(&self) -> GameSortField {
        GameSortField::parse(self.sort.as_deref())
    }

    fn descending(&self) -> bool {
        self.order.as_deref() == Some("desc")
    }
}

/// `GET /api/games`
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GamePage>> {
    let page = GameRepository::new(state.pool())
        .find_paginated(
            query.page()?,
            query.page_size()?,
            query.sort(),
            query.descending(),
        )
        .await?;

    Ok(Json(page))
}

/// Search parameters: the standard page query plus the search term.
///
/// Fields are spelled out rather than flattened; `serde_urlencoded`
/// cannot deserialize numeric fields through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SearchQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
            sort: self.sort.clone(),
            order: self.order.clone(),
        }
    }
}

/// `GET /api/games/search`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<GamePage>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(AppError::BadRequest(
            "search term must not be empty".to_string(),
        ));
    }

    let paging = query.page_query();
    let page = GameRepository::new(state.pool())
        .search(
            term,
            paging.page()?,
            paging.page_size()?,
            paging.sort(),
            paging.descending(),
        )
        .await?;

    Ok(Json(page))
}

/// `GET /api/games/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<GameId>,
) -> Result<Json<Game>> {
    let game = GameRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;

    Ok(Json(game))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, page_size: Option<i64>) -> PageQuery {
        PageQuery {
            page,
            page_size,
            sort: None,
            order: None,
        }
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let q = query(None, None);
        assert_eq!(q.page().expect("valid"), 0);
        assert_eq!(q.page_size().expect("valid"), DEFAULT_PAGE_SIZE);
        assert_eq!(q.sort(), GameSortField::Id);
        assert!(!q.descending());
    }

    #[test]
    fn negative_page_is_rejected() {
        assert!(query(Some(-1), None).page().is_err());
    }

    #[test]
    fn page_size_bounds_are_enforced() {
        assert!(query(None, Some(0)).page_size().is_err());
        assert!(query(None, Some(MAX_PAGE_SIZE + 1)).page_size().is_err());
        assert_eq!(
            query(None, Some(MAX_PAGE_SIZE)).page_size().expect("valid"),
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn order_param_controls_direction() {
        let mut q = query(None, None);
        q.order = Some("desc".to_string());
        assert!(q.descending());
        q.order = Some("asc".to_string());
        assert!(!q.descending());
    }
}
