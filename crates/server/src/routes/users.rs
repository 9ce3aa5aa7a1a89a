//! User route handlers.
//!
//! The admin listing and the profile view both return sanitized
//! projections; the password hash and refresh token never leave the
//! server.

use axum::{
    Json,
    extract::{Path, State},
};

use replay_core::UserId;

use crate::db::users::UserRepository;
use crate::db::orders::OrderRepository;
use crate::db::{CatalogStore, OrderStore, UserStore};
use crate::db::games::GameRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Game, Order, User, UserProfile, UserSummary};
use crate::state::AppState;

/// `GET /api/users` (admin only)
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserSummary>>> {
    let users = UserRepository::new(state.pool()).list().await?;

    Ok(Json(users.iter().map(User::summary).collect()))
}

/// `GET /api/users/{id}` (owner or admin)
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>> {
    current.ensure_owner_or_admin(id)?;

    let user = fetch_user(&state, id).await?;
    Ok(Json(user.profile()))
}

/// `GET /api/users/{id}/purchases` (owner or admin)
pub async fn purchases(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Game>>> {
    current.ensure_owner_or_admin(id)?;

    let user = fetch_user(&state, id).await?;
    let ids: Vec<_> = user.purchases.iter().copied().collect();
    let games = GameRepository::new(state.pool())
        .find_many_by_ids(&ids)
        .await?;

    Ok(Json(games))
}

/// `GET /api/users/{id}/orders` (owner or admin)
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    current.ensure_owner_or_admin(id)?;

    // Confirm the user exists so an unknown id is 404, not an empty list
    fetch_user(&state, id).await?;
    let orders = OrderRepository::new(state.pool()).find_by_user(id).await?;

    Ok(Json(orders))
}

async fn fetch_user(state: &AppState, id: UserId) -> Result<User> {
    UserRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}
