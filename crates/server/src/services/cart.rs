//! Cart mutations.
//!
//! The cart is a set of game ids on the user row: adds are idempotent,
//! and a game already purchased never re-enters the cart. Removal with
//! the reserved id `0` empties the cart in one call.

use thiserror::Error;

use replay_core::{GameId, UserId};

use crate::db::{CatalogStore, RepositoryError, UserStore};
use crate::models::{Game, User};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No such user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// No such game in the catalog.
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// Underlying store failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart operations over a [`UserStore`] and a [`CatalogStore`].
pub struct CartService<S, C> {
    users: S,
    catalog: C,
}

impl<S: UserStore + Sync, C: CatalogStore + Sync> CartService<S, C> {
    pub const fn new(users: S, catalog: C) -> Self {
        Self { users, catalog }
    }

    /// Resolve a user's cart into full catalog entries.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub async fn contents(&self, user_id: UserId) -> Result<Vec<Game>, CartError> {
        let user = self.fetch_user(user_id).await?;
        let games = self.catalog.find_many_by_ids(&user.cart_ids()).await?;
        Ok(games)
    }

    /// Add a game to the cart. Idempotent, and already-purchased games
    /// are silently kept out.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user does not exist
    /// - `GameNotFound` if the game is not in the catalog
    pub async fn add(&self, user_id: UserId, game_id: GameId) -> Result<User, CartError> {
        let mut user = self.fetch_user(user_id).await?;

        self.catalog
            .find_by_id(game_id)
            .await?
            .ok_or(CartError::GameNotFound(game_id))?;

        user.add_to_cart(game_id);
        self.users.save(&user).await?;

        tracing::debug!(user_id = %user_id, game_id = %game_id, "Added to cart");
        Ok(user)
    }

    /// Remove a game from the cart. The reserved id `0` clears the whole
    /// cart; removing an id that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub async fn remove(&self, user_id: UserId, game_id: GameId) -> Result<User, CartError> {
        let mut user = self.fetch_user(user_id).await?;

        if game_id.is_clear_sentinel() {
            user.clear_cart();
            tracing::debug!(user_id = %user_id, "Cleared cart");
        } else {
            user.remove_from_cart(game_id);
            tracing::debug!(user_id = %user_id, game_id = %game_id, "Removed from cart");
        }

        self.users.save(&user).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<User, CartError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(CartError::UserNotFound(user_id))
    }
}
