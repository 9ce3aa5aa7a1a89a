//! Checkout: turn a cart into an order.
//!
//! Validation runs strictly before any write. Shipping and payment are
//! checked first, prices are re-read from the catalog rather than
//! trusted from the client, and the order insert plus the user update
//! commit as one unit. A failed checkout leaves the cart untouched.
//!
//! Card details are validated and discarded; nothing about the card is
//! persisted or logged.

use thiserror::Error;

use replay_core::{Price, UserId};

use crate::db::{CatalogStore, OrderStore, RepositoryError, UserStore};
use crate::models::{Address, NewOrder, Order, PaymentCard, User};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No such user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// Shipping address failed validation.
    #[error("invalid shipping address: {0}")]
    InvalidAddress(String),

    /// Payment card failed validation.
    #[error("invalid payment details: {0}")]
    InvalidPayment(String),

    /// A cart id has no catalog entry. The catalog is read-only at
    /// runtime, so this indicates corrupt state rather than user error.
    #[error("catalog inconsistency: {0}")]
    CatalogInconsistency(String),

    /// Underlying store failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The checkout pipeline over the three store seams.
pub struct CheckoutService<S, C, O> {
    users: S,
    catalog: C,
    orders: O,
}

impl<S, C, O> CheckoutService<S, C, O>
where
    S: UserStore + Sync,
    C: CatalogStore + Sync,
    O: OrderStore + Sync,
{
    pub const fn new(users: S, catalog: C, orders: O) -> Self {
        Self { users, catalog, orders }
    }

    /// Validate and commit a checkout, returning the recorded order.
    ///
    /// On success the cart is merged into purchases and emptied.
    ///
    /// # Errors
    ///
    /// Any validation failure aborts before the first write, so the
    /// cart and purchase history are unchanged on error.
    pub async fn checkout(
        &self,
        user_id: UserId,
        shipping: Address,
        card: &PaymentCard,
    ) -> Result<Order, CheckoutError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CheckoutError::UserNotFound(user_id))?;

        if user.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        shipping
            .validate()
            .map_err(|err| CheckoutError::InvalidAddress(err.to_string()))?;
        card.validate()
            .map_err(|err| CheckoutError::InvalidPayment(err.to_string()))?;

        let total = self.price_cart(&user).await?;
        let game_ids = user.cart_ids();

        user.merge_cart_into_purchases();

        let order = self
            .orders
            .commit_checkout(
                &user,
                NewOrder {
                    user_id: user.id,
                    shipping,
                    game_ids,
                    total,
                },
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            order_id = %order.id,
            total = %total.display(),
            items = order.game_ids.len(),
            "Checkout committed"
        );

        Ok(order)
    }

    /// Sum the cart against current catalog prices.
    async fn price_cart(&self, user: &User) -> Result<Price, CheckoutError> {
        let ids = user.cart_ids();
        let games = self.catalog.find_many_by_ids(&ids).await?;

        if games.len() != ids.len() {
            let missing: Vec<_> = ids
                .iter()
                .filter(|id| !games.iter().any(|g| g.id == **id))
                .collect();
            return Err(CheckoutError::CatalogInconsistency(format!(
                "cart references unknown game ids {missing:?}"
            )));
        }

        Ok(games.iter().map(|game| game.price).sum())
    }
}

#[cfg(test)]
mod tests {
    use replay_core::{GameId, Role, Username};

    use crate::db::memory::MemoryStore;

    use super::*;

    fn valid_address() -> Address {
        Address {
            full_name: "Ada Lovelace".to_string(),
            country: "United States".to_string(),
            city: "Portland".to_string(),
            region: "OR".to_string(),
            postal_code: "97201".to_string(),
            street: "100 Main St".to_string(),
        }
    }

    fn valid_card() -> PaymentCard {
        PaymentCard {
            card_name: "Ada Lovelace".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            card_exp: "12/30".to_string(),
            card_cvv: "123".to_string(),
            card_zip: "97201".to_string(),
        }
    }

    async fn user_with_cart(store: &MemoryStore, games: &[GameId]) -> User {
        let mut user = UserStore::create(
            &store,
            &Username::parse("buyer").expect("valid"),
            "$argon2id$stub",
            Role::User,
        )
        .await
        .expect("creates");

        for id in games {
            user.add_to_cart(*id);
        }
        UserStore::save(&store, &user).await.expect("saves");
        user
    }

    #[tokio::test]
    async fn checkout_totals_and_moves_cart_to_purchases() {
        let store = MemoryStore::new();
        let a = store.seed_game(1, 1000);
        let b = store.seed_game(2, 2500);
        let user = user_with_cart(&store, &[a, b]).await;

        let svc = CheckoutService::new(&store, &store, &store);
        let order = svc
            .checkout(user.id, valid_address(), &valid_card())
            .await
            .expect("commits");

        assert_eq!(order.total, Price::from_minor_units(3500));
        assert_eq!(order.game_ids.len(), 2);

        let user = store.user(user.id).expect("exists");
        assert!(user.cart.is_empty());
        assert!(user.purchases.contains(&a));
        assert!(user.purchases.contains(&b));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let store = MemoryStore::new();
        let user = user_with_cart(&store, &[]).await;

        let svc = CheckoutService::new(&store, &store, &store);
        assert!(matches!(
            svc.checkout(user.id, valid_address(), &valid_card()).await,
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let store = MemoryStore::new();
        let svc = CheckoutService::new(&store, &store, &store);

        assert!(matches!(
            svc.checkout(UserId::new(404), valid_address(), &valid_card())
                .await,
            Err(CheckoutError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn bad_card_leaves_cart_untouched() {
        let store = MemoryStore::new();
        let game = store.seed_game(1, 1000);
        let user = user_with_cart(&store, &[game]).await;

        let mut card = valid_card();
        // Fails the Luhn checksum
        card.card_number = "4111111111111112".to_string();

        let svc = CheckoutService::new(&store, &store, &store);
        assert!(matches!(
            svc.checkout(user.id, valid_address(), &card).await,
            Err(CheckoutError::InvalidPayment(_))
        ));

        let user = store.user(user.id).expect("exists");
        assert_eq!(user.cart_ids(), vec![game]);
        assert!(user.purchases.is_empty());
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn bad_address_is_rejected_before_payment() {
        let store = MemoryStore::new();
        let game = store.seed_game(1, 1000);
        let user = user_with_cart(&store, &[game]).await;

        let mut address = valid_address();
        address.postal_code = "ABCDE".to_string();

        let svc = CheckoutService::new(&store, &store, &store);
        assert!(matches!(
            svc.checkout(user.id, address, &valid_card()).await,
            Err(CheckoutError::InvalidAddress(_))
        ));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn cart_id_missing_from_catalog_is_an_inconsistency() {
        let store = MemoryStore::new();
        let game = store.seed_game(1, 1000);
        let mut user = user_with_cart(&store, &[game]).await;

        // Sneak an id into the cart that the catalog does not know
        user.cart.insert(GameId::new(999));
        UserStore::save(&&store, &user).await.expect("saves");

        let svc = CheckoutService::new(&store, &store, &store);
        assert!(matches!(
            svc.checkout(user.id, valid_address(), &valid_card()).await,
            Err(CheckoutError::CatalogInconsistency(_))
        ));
        assert_eq!(store.order_count(), 0);
    }
}
