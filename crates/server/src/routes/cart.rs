//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use replay_core::{GameId, UserId};

use crate::db::games::GameRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Game, UserProfile};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body for adding a game to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub game_id: GameId,
}

/// `GET /api/users/{id}/cart` (owner or admin)
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Game>>> {
    current.ensure_owner_or_admin(id)?;

    let cart = CartService::new(
        UserRepository::new(state.pool()),
        GameRepository::new(state.pool()),
    );
    let games = cart.contents(id).await?;

    Ok(Json(games))
}

/// `POST /api/users/{id}/cart/items` (owner or admin)
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<UserProfile>> {
    current.ensure_owner_or_admin(id)?;

    let cart = CartService::new(
        UserRepository::new(state.pool()),
        GameRepository::new(state.pool()),
    );
    let user = cart.add(id, body.game_id).await?;

    Ok(Json(user.profile()))
}

/// `DELETE /api/users/{id}/cart/items/{gid}` (owner or admin)
///
/// The reserved game id `0` clears the whole cart.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path((id, game_id)): Path<(UserId, GameId)>,
) -> Result<Json<UserProfile>> {
    current.ensure_owner_or_admin(id)?;

    let cart = CartService::new(
        UserRepository::new(state.pool()),
        GameRepository::new(state.pool()),
    );
    let user = cart.remove(id, game_id).await?;

    Ok(Json(user.profile()))
}
