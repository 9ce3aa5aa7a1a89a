//! Order domain types.
//!
//! An order is an immutable financial record: once written it is never
//! updated, and the address and item list inside it are snapshots taken
//! at commit time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use replay_core::{GameId, OrderId, Price, UserId};

use super::address::Address;

/// A completed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Shipping address frozen at checkout time.
    pub shipping: Address,
    /// Item ids frozen at checkout time.
    pub game_ids: Vec<GameId>,
    /// Total computed from authoritative catalog prices.
    pub total: Price,
}

/// An order about to be committed; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping: Address,
    pub game_ids: Vec<GameId>,
    pub total: Price,
}
