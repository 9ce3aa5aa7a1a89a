//! User domain types.
//!
//! The user row is the unit of persistence: cart, purchases, and the live
//! refresh credential all live on it and are written back as a whole.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use replay_core::{GameId, Role, UserId, Username};

/// A store user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique account name.
    pub username: Username,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Authorization role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the user last logged in, if ever.
    pub last_login: Option<DateTime<Utc>>,
    /// The single live refresh token, if a session is open.
    pub refresh_token: Option<String>,
    /// Games the user intends to purchase.
    pub cart: BTreeSet<GameId>,
    /// Games the user has completed checkout on.
    pub purchases: BTreeSet<GameId>,
}

impl User {
    /// Add a game to the cart, then re-apply the cart/purchases
    /// disjointness invariant. Adding twice has the same effect as once.
    pub fn add_to_cart(&mut self, game_id: GameId) {
        self.cart.insert(game_id);
        self.remove_purchased_from_cart();
    }

    /// Remove a game from the cart. No-op when absent.
    pub fn remove_from_cart(&mut self, game_id: GameId) {
        self.cart.remove(&game_id);
    }

    /// Empty the cart entirely.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Move every cart item into purchases and empty the cart.
    ///
    /// Called by checkout after the order snapshot is built.
    pub fn merge_cart_into_purchases(&mut self) {
        self.purchases.append(&mut self.cart);
    }

    /// Drop any cart entry that is already purchased.
    ///
    /// Invariant: `cart ∩ purchases = ∅` after every cart mutation.
    fn remove_purchased_from_cart(&mut self) {
        self.cart = self.cart.difference(&self.purchases).copied().collect();
    }

    /// Sorted cart ids, for persistence and order snapshots.
    #[must_use]
    pub fn cart_ids(&self) -> Vec<GameId> {
        self.cart.iter().copied().collect()
    }

    /// Minimal identity carried through request handling.
    #[must_use]
    pub fn current(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    /// Full profile view with credentials stripped.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
            last_login: self.last_login,
            cart: self.cart.iter().copied().collect(),
            purchases: self.purchases.iter().copied().collect(),
        }
    }

    /// Minimal listing view for the admin user index.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            last_login: self.last_login,
        }
    }
}

/// Request-scoped identity attached by the authentication guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's account name.
    pub username: Username,
    /// Role claimed by the verified access token.
    pub role: Role,
}

impl CurrentUser {
    /// Owner-or-admin authorization rule.
    #[must_use]
    pub fn may_act_for(&self, resource_owner: UserId) -> bool {
        self.role.is_admin() || self.id == resource_owner
    }

    /// Reject with `Forbidden` unless the owner-or-admin rule holds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when `self` is neither the resource
    /// owner nor an admin.
    pub fn ensure_owner_or_admin(&self, resource_owner: UserId) -> Result<(), crate::error::AppError> {
        if self.may_act_for(resource_owner) {
            Ok(())
        } else {
            Err(crate::error::AppError::Forbidden(
                "not the resource owner".to_string(),
            ))
        }
    }
}

/// A user as returned to its owner (or an admin). Never carries the
/// password hash or refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: Username,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub cart: Vec<GameId>,
    pub purchases: Vec<GameId>,
}

/// Sanitized listing entry for `GET /api/users`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: Username,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
}
