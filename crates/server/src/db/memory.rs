//! In-memory store used by unit tests.
//!
//! Implements every store trait over mutex-guarded maps so services can be
//! exercised without a database. Behaves like the Postgres repositories:
//! full-row last-write-wins saves, atomic checkout commit.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;

use replay_core::{GameId, OrderId, Price, Role, UserId, Username};

use super::{CatalogStore, OrderStore, RepositoryError, UserStore};
use crate::models::{Game, NewOrder, Order, User};

/// Shared in-memory backing store for tests.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<BTreeMap<UserId, User>>,
    games: Mutex<BTreeMap<GameId, Game>>,
    orders: Mutex<Vec<Order>>,
    next_user_id: Mutex<i32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_user_id: Mutex::new(1),
            ..Self::default()
        }
    }

    /// Seed a catalog entry.
    pub fn insert_game(&self, game: Game) {
        self.games.lock().unwrap().insert(game.id, game);
    }

    /// Minimal game fixture with the given id and price in minor units.
    pub fn seed_game(&self, id: i32, price: i64) -> GameId {
        let game_id = GameId::new(id);
        self.insert_game(Game {
            id: game_id,
            name: format!("Game {id}"),
            developer: "Test Dev".to_string(),
            publisher: "Test Pub".to_string(),
            genre: "Action".to_string(),
            tags: vec!["indie".to_string()],
            price: Price::from_minor_units(price),
            initial_price: Price::from_minor_units(price),
            discount: 0,
            positive: 100,
            negative: 5,
            ccu: 10,
        });
        game_id
    }

    /// Number of committed orders.
    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// Fetch a user snapshot directly, bypassing the trait.
    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }
}

impl UserStore for &MemoryStore {
    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == *username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let mut next = self.next_user_id.lock().unwrap();
        let user = User {
            id: UserId::new(*next),
            username: username.clone(),
            password_hash: password_hash.to_owned(),
            role,
            created_at: Utc::now(),
            last_login: None,
            refresh_token: None,
            cart: Default::default(),
            purchases: Default::default(),
        };
        *next += 1;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == *username)
            .cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.refresh_token.as_deref() == Some(token))
            .cloned())
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }
}

impl CatalogStore for &MemoryStore {
    async fn find_by_id(&self, id: GameId) -> Result<Option<Game>, RepositoryError> {
        Ok(self.games.lock().unwrap().get(&id).cloned())
    }

    async fn find_many_by_ids(&self, ids: &[GameId]) -> Result<Vec<Game>, RepositoryError> {
        let games = self.games.lock().unwrap();
        Ok(ids.iter().filter_map(|id| games.get(id).cloned()).collect())
    }
}

impl OrderStore for &MemoryStore {
    async fn commit_checkout(
        &self,
        user: &User,
        order: NewOrder,
    ) -> Result<Order, RepositoryError> {
        // Both writes under the same locks: all-or-nothing like the Pg tx
        let mut orders = self.orders.lock().unwrap();
        let mut users = self.users.lock().unwrap();

        let committed = Order {
            id: OrderId::new(i32::try_from(orders.len()).unwrap_or(i32::MAX) + 1),
            user_id: order.user_id,
            created_at: Utc::now(),
            shipping: order.shipping,
            game_ids: order.game_ids,
            total: order.total,
        };
        orders.push(committed.clone());
        users.insert(user.id, user.clone());
        Ok(committed)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.reverse();
        Ok(orders)
    }
}
