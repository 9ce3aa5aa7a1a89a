//! Domain models for the server.
//!
//! These types represent validated domain objects separate from database
//! row types. Value objects used only during checkout (address, payment
//! card) live here too.

pub mod address;
pub mod game;
pub mod order;
pub mod payment;
pub mod user;

pub use address::Address;
pub use game::{Game, GameSortField};
pub use order::{NewOrder, Order};
pub use payment::PaymentCard;
pub use user::{CurrentUser, User, UserProfile, UserSummary};
