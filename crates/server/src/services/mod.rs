//! Business logic services.
//!
//! Services hold the rules; repositories hold the SQL. Each service is
//! generic over the store traits in [`crate::db`], so the same logic is
//! exercised against Postgres in production and the in-memory store in
//! unit tests.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod tokens;
