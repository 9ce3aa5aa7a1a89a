//! Request guards for authenticated routes.

pub mod auth;

pub use auth::{RequireAdmin, RequireAuth};
