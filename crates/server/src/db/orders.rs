//! Order repository.
//!
//! Orders are insert-only. The checkout commit writes the order and the
//! updated user row inside a single transaction so a crash between the
//! two writes cannot strand a paid order against a stale cart.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use replay_core::{GameId, OrderId, Price, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{Address, NewOrder, Order, User};

/// Raw `orders` row before domain validation.
#[derive(FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    shipping: serde_json::Value,
    game_ids: Vec<i32>,
    total: i64,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let shipping: Address = serde_json::from_value(self.shipping).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shipping snapshot in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            created_at: self.created_at,
            shipping,
            game_ids: self.game_ids.into_iter().map(GameId::new).collect(),
            total: Price::from_minor_units(self.total),
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, created_at, shipping, game_ids, total";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn commit_checkout(
        &self,
        user: &User,
        order: NewOrder,
    ) -> Result<Order, RepositoryError> {
        let shipping = serde_json::to_value(&order.shipping).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable shipping snapshot: {e}"))
        })?;
        let game_ids: Vec<i32> = order.game_ids.iter().map(|id| id.as_i32()).collect();
        let cart: Vec<i32> = user.cart.iter().map(|id| id.as_i32()).collect();
        let purchases: Vec<i32> = user.purchases.iter().map(|id| id.as_i32()).collect();

        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO orders (user_id, shipping, game_ids, total) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(order.user_id.as_i32())
            .bind(&shipping)
            .bind(&game_ids)
            .bind(order.total.as_minor_units())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET cart = $2, purchases = $3 WHERE id = $1")
            .bind(user.id.as_i32())
            .bind(&cart)
            .bind(&purchases)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_order()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(user_id.as_i32())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
