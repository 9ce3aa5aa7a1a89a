//! HTTP route handlers for the store API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/health                  - Liveness check
//! GET  /api/health/ready            - Readiness check (DB ping)
//!
//! # Auth
//! POST /api/auth/register           - Create account, open session
//! POST /api/auth/login              - Open session
//! POST /api/auth/refresh            - Rotate the refresh credential
//! POST /api/auth/logout             - Revoke the refresh credential
//! GET  /api/auth/me                 - Current user's profile
//!
//! # Catalog (public)
//! GET  /api/games                   - Paginated listing
//! GET  /api/games/search            - Substring search
//! GET  /api/games/{id}              - Game detail
//!
//! # Users
//! GET  /api/users                   - Admin-only listing
//! GET  /api/users/{id}              - Owner-or-admin profile
//!
//! # Cart and checkout (owner-or-admin)
//! GET    /api/users/{id}/cart            - Resolved cart contents
//! POST   /api/users/{id}/cart/items      - Add a game
//! DELETE /api/users/{id}/cart/items/{gid} - Remove a game (0 clears all)
//! POST   /api/users/{id}/checkout        - Commit the cart into an order
//! GET    /api/users/{id}/purchases       - Resolved purchased games
//! GET    /api/users/{id}/orders          - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod games;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the public catalog routes router.
pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(games::index))
        .route("/search", get(games::search))
        .route("/{id}", get(games::show))
}

/// Create the user, cart, and checkout routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", get(users::show))
        .route("/{id}/cart", get(cart::show))
        .route("/{id}/cart/items", post(cart::add))
        .route("/{id}/cart/items/{gid}", delete(cart::remove))
        .route("/{id}/checkout", post(checkout::checkout))
        .route("/{id}/purchases", get(users::purchases))
        .route("/{id}/orders", get(users::orders))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/games", game_routes())
        .nest("/api/users", user_routes())
}
